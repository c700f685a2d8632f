use serde::{Deserialize, Serialize};

use crate::error::DraftError;

/// Screen the onboarding wizard resumes on. Stored inside the draft so an
/// interrupted signup picks up where it left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Phone,
    Otp,
    OwnerProfile,
    KitchenDetails,
    KitchenAddress,
    Categories,
    Documents,
    Review,
    Submitted,
}

/// Everything the onboarding wizard accumulates, one optional field per
/// datum. Each screen fills in its slice and overlays it on the stored
/// draft; a field can be overwritten but never deleted short of clearing
/// the whole draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<OnboardingStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kitchen_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kitchen_logo: Option<String>,
}

impl DraftFields {
    /// Field-wise last-write-wins overlay: every field set in `incoming`
    /// replaces the current value, every unset field keeps it.
    pub fn merged_with(&self, incoming: &DraftFields) -> DraftFields {
        fn pick<T: Clone>(current: &Option<T>, incoming: &Option<T>) -> Option<T> {
            incoming.clone().or_else(|| current.clone())
        }

        DraftFields {
            phone: pick(&self.phone, &incoming.phone),
            step: pick(&self.step, &incoming.step),
            full_name: pick(&self.full_name, &incoming.full_name),
            kitchen_name: pick(&self.kitchen_name, &incoming.kitchen_name),
            address: pick(&self.address, &incoming.address),
            city: pick(&self.city, &incoming.city),
            categories: pick(&self.categories, &incoming.categories),
            cnic: pick(&self.cnic, &incoming.cnic),
            bank_account: pick(&self.bank_account, &incoming.bank_account),
            profile_image: pick(&self.profile_image, &incoming.profile_image),
            kitchen_logo: pick(&self.kitchen_logo, &incoming.kitchen_logo),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == DraftFields::default()
    }

    /// Checked at every merge boundary so a screen cannot persist junk that
    /// only surfaces during the approval review.
    pub fn validate(&self) -> Result<(), DraftError> {
        if let Some(phone) = &self.phone {
            let digits = phone.strip_prefix('+').unwrap_or_default();
            if digits.len() < 8
                || digits.len() > 15
                || !digits.chars().all(|c| c.is_ascii_digit())
            {
                return Err(DraftError::InvalidPhone(phone.clone()));
            }
        }

        let text_fields = [
            ("full_name", &self.full_name),
            ("kitchen_name", &self.kitchen_name),
            ("address", &self.address),
            ("city", &self.city),
            ("cnic", &self.cnic),
            ("bank_account", &self.bank_account),
        ];
        for (name, value) in text_fields {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    return Err(DraftError::BlankField(name));
                }
            }
        }

        Ok(())
    }
}

/// Server-side mirror of the draft, keyed by phone number. Last write wins;
/// the backend applies no field-level merge of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSession {
    pub phone: String,
    pub fields: DraftFields,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone_step() -> DraftFields {
        DraftFields {
            phone: Some("+9230012345".into()),
            step: Some(OnboardingStep::Otp),
            ..DraftFields::default()
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let base = DraftFields::default();
        let partial = phone_step();

        let once = base.merged_with(&partial);
        let twice = once.merged_with(&partial);
        assert_eq!(once, twice);
    }

    #[test]
    fn later_merge_wins_per_field() {
        let a = phone_step();
        let b = DraftFields {
            step: Some(OnboardingStep::KitchenDetails),
            full_name: Some("Asim".into()),
            ..DraftFields::default()
        };

        let merged = DraftFields::default().merged_with(&a).merged_with(&b);
        assert_eq!(merged.phone.as_deref(), Some("+9230012345"));
        assert_eq!(merged.step, Some(OnboardingStep::KitchenDetails));
        assert_eq!(merged.full_name.as_deref(), Some("Asim"));
    }

    #[test]
    fn unset_fields_never_remove() {
        let merged = phone_step().merged_with(&DraftFields::default());
        assert_eq!(merged, phone_step());
    }

    #[test]
    fn roundtrips_through_json() {
        let draft = phone_step();
        let raw = serde_json::to_string(&draft).unwrap();
        let back: DraftFields = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, draft);
    }

    #[test]
    fn validate_rejects_bad_phones() {
        for phone in ["0300", "+92abc12345", "+123", "923001234567"] {
            let draft = DraftFields {
                phone: Some(phone.into()),
                ..DraftFields::default()
            };
            assert!(draft.validate().is_err(), "accepted {phone}");
        }
        assert!(phone_step().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_text_fields() {
        let draft = DraftFields {
            kitchen_name: Some("   ".into()),
            ..DraftFields::default()
        };
        assert!(matches!(
            draft.validate(),
            Err(DraftError::BlankField("kitchen_name"))
        ));
    }
}
