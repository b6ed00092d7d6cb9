//! Person record.
//!
//! # Responsibility
//! - Hold person attributes, including the validated phone number.
//!
//! # Invariants
//! - The stored phone is either absent or a valid 10-digit `Phone`.
//! - A rejected phone write leaves the previously stored value untouched.

use crate::model::phone::{Phone, PhoneError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    phone: Option<Phone>,
}

impl Person {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            age: None,
            phone: None,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Builder form of `set_phone`.
    pub fn with_phone(mut self, input: &str) -> Result<Self, PhoneError> {
        self.set_phone(input)?;
        Ok(self)
    }

    /// Validates and stores a phone number.
    ///
    /// # Errors
    /// - Returns `PhoneError` when `input` does not normalize to 10 digits;
    ///   the current value is kept.
    pub fn set_phone(&mut self, input: &str) -> Result<(), PhoneError> {
        let phone = Phone::parse(input)?;
        self.phone = Some(phone);
        Ok(())
    }

    /// Returns the phone number formatted as `DDD-DDD-DDDD`.
    pub fn phone(&self) -> Option<String> {
        self.phone.as_ref().map(Phone::formatted)
    }

    /// Returns the stored normalized digits.
    pub fn phone_digits(&self) -> Option<&str> {
        self.phone.as_ref().map(Phone::digits)
    }

    pub(crate) fn stored_phone(&self) -> Option<&Phone> {
        self.phone.as_ref()
    }

    /// Restores an already validated phone read from the store.
    pub(crate) fn with_stored_phone(mut self, phone: Option<Phone>) -> Self {
        self.phone = phone;
        self
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Person: {} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::Person;
    use crate::model::phone::PhoneError;

    #[test]
    fn new_person_has_no_phone() {
        let person = Person::new("Tom", "Smith");
        assert_eq!(person.phone(), None);
        assert_eq!(person.phone_digits(), None);
    }

    #[test]
    fn rejected_write_keeps_previous_phone() {
        let mut person = Person::new("Sue", "Johson");
        person.set_phone("555 243 9988").unwrap();

        let err = person.set_phone("555-555-555").unwrap_err();
        assert_eq!(err, PhoneError::InvalidLength { digits: 9 });
        assert_eq!(person.phone_digits(), Some("5552439988"));
        assert_eq!(person.phone().as_deref(), Some("555-243-9988"));
    }

    #[test]
    fn rejected_first_write_leaves_phone_unset() {
        let mut person = Person::new("Tom", "Smith");
        assert!(person.set_phone("12345678901").is_err());
        assert_eq!(person.phone_digits(), None);
    }
}
