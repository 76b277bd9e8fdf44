//! Registration input validation.

use serde_json::{json, Value};

use crate::error::TellerKitError;
use crate::user::normalize_phone;

/// The fixed set of profile fields a registration must provide.
///
/// Every field is required to be non-empty; validation happens locally
/// and a failing form never reaches the network.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email address.
    pub email: String,
    /// Contact phone number; normalized to digits before submission.
    pub phone: String,
    /// Date of birth, as the UI captured it.
    pub date_of_birth: String,
    /// Government-issued identifier.
    pub government_id: String,
    /// Street address.
    pub street: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub zip: String,
    /// Security question chosen by the user.
    pub security_question: String,
    /// Answer to the security question.
    pub security_answer: String,
}

impl RegistrationForm {
    /// Validates the form and builds the submission payload.
    ///
    /// The phone number is normalized to digits only and must then be
    /// exactly 10 digits.
    ///
    /// # Errors
    ///
    /// Returns [`TellerKitError::Validation`] naming the first offending
    /// field. No network call is made and no stored state is touched.
    pub fn validate(&self) -> Result<Value, TellerKitError> {
        let required: &[(&str, &str, &str)] = &[
            ("firstName", self.first_name.as_str(), "First name"),
            ("lastName", self.last_name.as_str(), "Last name"),
            ("email", self.email.as_str(), "Email"),
            ("phone", self.phone.as_str(), "Phone number"),
            ("dateOfBirth", self.date_of_birth.as_str(), "Date of birth"),
            ("governmentId", self.government_id.as_str(), "Government ID"),
            ("street", self.street.as_str(), "Street"),
            ("city", self.city.as_str(), "City"),
            ("state", self.state.as_str(), "State"),
            ("zipCode", self.zip.as_str(), "ZIP code"),
            (
                "securityQuestion",
                self.security_question.as_str(),
                "Security question",
            ),
            (
                "securityAnswer",
                self.security_answer.as_str(),
                "Security answer",
            ),
        ];
        for (attribute, value, label) in required {
            if value.trim().is_empty() {
                return Err(TellerKitError::validation(
                    attribute,
                    format!("{label} is required"),
                ));
            }
        }

        let phone = normalize_phone(&self.phone);
        if phone.len() != 10 {
            return Err(TellerKitError::validation(
                "phone",
                "Phone number must be 10 digits",
            ));
        }

        Ok(json!({
            "firstName": self.first_name.trim(),
            "lastName": self.last_name.trim(),
            "email": self.email.trim(),
            "phone": phone,
            "dateOfBirth": self.date_of_birth.trim(),
            "governmentId": self.government_id.trim(),
            "address": {
                "street": self.street.trim(),
                "city": self.city.trim(),
                "state": self.state.trim(),
                "zipCode": self.zip.trim(),
            },
            "securityQuestion": self.security_question.trim(),
            "securityAnswer": self.security_answer.trim(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn filled_form() -> RegistrationForm {
        RegistrationForm {
            first_name: "Alice".into(),
            last_name: "Example".into(),
            email: "alice@example.com".into(),
            phone: "(555) 123-4567".into(),
            date_of_birth: "1990-01-02".into(),
            government_id: "123-45-6789".into(),
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip: "62701".into(),
            security_question: "First pet?".into(),
            security_answer: "Rex".into(),
        }
    }

    #[test]
    fn test_valid_form_normalizes_phone() {
        let payload = filled_form().validate().expect("valid form");
        assert_eq!(payload["phone"], "5551234567");
        assert_eq!(payload["address"]["zipCode"], "62701");
    }

    #[test_case(|f| f.first_name.clear(); "first name")]
    #[test_case(|f| f.last_name.clear(); "last name")]
    #[test_case(|f| f.email.clear(); "email")]
    #[test_case(|f| f.phone.clear(); "phone")]
    #[test_case(|f| f.date_of_birth.clear(); "date of birth")]
    #[test_case(|f| f.government_id.clear(); "government id")]
    #[test_case(|f| f.street.clear(); "street")]
    #[test_case(|f| f.city.clear(); "city")]
    #[test_case(|f| f.state.clear(); "state")]
    #[test_case(|f| f.zip.clear(); "zip")]
    #[test_case(|f| f.security_question.clear(); "security question")]
    #[test_case(|f| f.security_answer.clear(); "security answer")]
    #[test_case(|f| f.city = "   ".into(); "whitespace only")]
    fn test_any_blank_required_field_fails(clear: fn(&mut RegistrationForm)) {
        let mut form = filled_form();
        clear(&mut form);
        let err = form.validate().expect_err("blank field");
        assert!(matches!(err, TellerKitError::Validation { .. }));
    }

    #[test_case("555-123-456"; "nine digits")]
    #[test_case("+1 555 123 4567"; "eleven digits")]
    #[test_case("not a phone"; "no digits")]
    fn test_phone_must_normalize_to_ten_digits(phone: &str) {
        let mut form = filled_form();
        form.phone = phone.to_string();
        let err = form.validate().expect_err("bad phone");
        match err {
            TellerKitError::Validation { attribute, .. } => assert_eq!(attribute, "phone"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
