use once_cell::sync::Lazy;
use regex::Regex;

static AADHAAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{12}$").unwrap());

static MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[6-9][0-9]{9}$").unwrap());

static PINCODE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-9][0-9]{5}$").unwrap());

static METER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9/-]{3,50}$").unwrap());

pub fn validate_aadhaar(aadhaar: &str) -> bool {
    AADHAAR_REGEX.is_match(aadhaar)
}

pub fn validate_mobile(mobile: &str) -> bool {
    MOBILE_REGEX.is_match(mobile)
}

pub fn validate_pincode(pincode: &str) -> bool {
    PINCODE_REGEX.is_match(pincode)
}

pub fn validate_meter_number(meter_number: &str) -> bool {
    METER_REGEX.is_match(meter_number)
}

pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}
