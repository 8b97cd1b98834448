use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use sqlx::PgPool;

use crate::models::{
    payment::{CreatePaymentData, Payment},
    user::UserDetail,
};
use crate::services::encryption::{EncryptionError, PaymentCipher};

#[derive(thiserror::Error, Debug)]
pub enum UpgradeError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Could not protect card number: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("Card number must be 12 to 19 digits")]
    InvalidCardNumber,

    #[error("Expiry date must be in MM/YY format")]
    InvalidExpiryFormat,

    #[error("Card has expired")]
    CardExpired,

    #[error("CVV must be 3 or 4 digits")]
    InvalidCvv,

    #[error("Cardholder name is required")]
    MissingCardholder,

    #[error("User not found")]
    UserNotFound,
}

/// Card details submitted by the payment form. The CVV is checked and dropped.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub cardholder_name: String,
}

/// Card details that passed validation
#[derive(Debug, PartialEq)]
pub struct ValidatedCard {
    pub number: String,
    pub expiry: String,
}

pub struct UpgradeResult {
    pub payment: Payment,
    pub user: UserDetail,
}

impl PaymentForm {
    /// Checks the form against the first day of the current month
    pub fn validate(&self, today: NaiveDate) -> Result<ValidatedCard, UpgradeError> {
        let number: String = self.card_number.chars().filter(|c| !c.is_whitespace()).collect();
        if !(12..=19).contains(&number.len()) || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(UpgradeError::InvalidCardNumber);
        }

        let (month, year) = parse_expiry(&self.expiry_date)?;
        if (year, month) < (today.year(), today.month()) {
            return Err(UpgradeError::CardExpired);
        }

        let cvv = self.cvv.trim();
        if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(UpgradeError::InvalidCvv);
        }

        if self.cardholder_name.trim().is_empty() {
            return Err(UpgradeError::MissingCardholder);
        }

        Ok(ValidatedCard {
            number,
            expiry: format!("{month:02}/{:02}", year % 100),
        })
    }
}

/// `MM/YY` into (month, four-digit year)
pub fn parse_expiry(value: &str) -> Result<(u32, i32), UpgradeError> {
    let (month, year) = value
        .trim()
        .split_once('/')
        .ok_or(UpgradeError::InvalidExpiryFormat)?;

    let two_digits = |s: &str| s.len() == 2 && s.chars().all(|c| c.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return Err(UpgradeError::InvalidExpiryFormat);
    }

    let month: u32 = month.parse().map_err(|_| UpgradeError::InvalidExpiryFormat)?;
    let year: i32 = year.parse().map_err(|_| UpgradeError::InvalidExpiryFormat)?;
    if !(1..=12).contains(&month) {
        return Err(UpgradeError::InvalidExpiryFormat);
    }

    Ok((month, 2000 + year))
}

/// Records a premium payment and flips the user to premium in one transaction.
///
/// Only the last four digits are stored in the clear; the full number is
/// sealed with the payment cipher.
#[tracing::instrument(skip(pool, cipher, form), fields(user_id = %user_id))]
pub async fn upgrade_to_premium(
    pool: &PgPool,
    cipher: &PaymentCipher,
    user_id: i32,
    amount: f64,
    form: &PaymentForm,
) -> Result<UpgradeResult, UpgradeError> {
    let card = form.validate(chrono::Utc::now().date_naive())?;

    let last_four = card.number[card.number.len() - 4..].to_string();
    let sealed = cipher.seal(&card.number)?;

    let mut tx = pool.begin().await?;

    let payment = Payment::create(
        &mut tx,
        CreatePaymentData {
            user_id,
            account_last_four: last_four,
            account_number_encrypted: sealed,
            card_expiry_date: card.expiry,
            amount,
        },
    )
    .await?;

    let user = UserDetail::set_premium(&mut tx, user_id, true)
        .await?
        .ok_or(UpgradeError::UserNotFound)?;

    tx.commit().await?;

    tracing::info!(
        payment_id = payment.payment_id,
        amount = payment.amount,
        "User upgraded to premium"
    );

    Ok(UpgradeResult { payment, user })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> PaymentForm {
        PaymentForm {
            card_number: "4242 4242 4242 4242".to_string(),
            expiry_date: "12/30".to_string(),
            cvv: "123".to_string(),
            cardholder_name: "Jane Doe".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn test_valid_form() {
        let card = form().validate(today()).unwrap();
        assert_eq!(card.number, "4242424242424242");
        assert_eq!(card.expiry, "12/30");
    }

    #[test]
    fn test_card_number_length_and_digits() {
        let mut f = form();
        f.card_number = "4242 4242 42".to_string();
        assert!(matches!(f.validate(today()), Err(UpgradeError::InvalidCardNumber)));

        f.card_number = "4242-4242-4242-4242".to_string();
        assert!(matches!(f.validate(today()), Err(UpgradeError::InvalidCardNumber)));

        f.card_number = "1".repeat(19);
        assert!(f.validate(today()).is_ok());
    }

    #[test]
    fn test_expiry_current_month_is_still_valid() {
        let mut f = form();
        f.expiry_date = "10/26".to_string();
        assert!(f.validate(today()).is_ok());

        f.expiry_date = "09/26".to_string();
        assert!(matches!(f.validate(today()), Err(UpgradeError::CardExpired)));

        f.expiry_date = "01/27".to_string();
        assert!(f.validate(today()).is_ok());
    }

    #[test]
    fn test_expiry_format() {
        let mut f = form();
        for bad in ["13/27", "00/27", "1/27", "12-27", "12/2027", "ab/cd"] {
            f.expiry_date = bad.to_string();
            assert!(
                matches!(f.validate(today()), Err(UpgradeError::InvalidExpiryFormat)),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_cvv_and_cardholder() {
        let mut f = form();
        f.cvv = "12".to_string();
        assert!(matches!(f.validate(today()), Err(UpgradeError::InvalidCvv)));

        f.cvv = "1234".to_string();
        assert!(f.validate(today()).is_ok());

        f.cardholder_name = "   ".to_string();
        assert!(matches!(f.validate(today()), Err(UpgradeError::MissingCardholder)));
    }
}
