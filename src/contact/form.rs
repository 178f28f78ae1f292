use std::collections::BTreeMap;

pub const NAME_MIN_CHARS: usize = 2;
pub const MESSAGE_MIN_CHARS: usize = 10;

/// Values of the contact form. Serialises with the field names the mail relay expects.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
    pub agreed_to_terms: bool,
    /// Honeypot. Hidden from people, so anything in it came from a bot.
    pub website: String,
}

impl ContactForm {
    /// Form with terms accepted and an empty honeypot.
    pub fn new(name: impl Into<String>, email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
            agreed_to_terms: true,
            website: String::new(),
        }
    }

    pub fn with_terms(mut self, agreed: bool) -> Self {
        self.agreed_to_terms = agreed;
        self
    }

    pub fn with_honeypot(mut self, website: impl Into<String>) -> Self {
        self.website = website.into();
        self
    }

    pub fn is_spam(&self) -> bool {
        !self.website.is_empty()
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if let Some(e) = check_min_len(&self.name, NAME_MIN_CHARS) {
            errors.insert(FormField::Name, e);
        }
        if self.email.trim().is_empty() {
            errors.insert(FormField::Email, FieldError::Required);
        } else if !is_valid_email(&self.email) {
            errors.insert(FormField::Email, FieldError::InvalidEmail);
        }
        if let Some(e) = check_min_len(&self.message, MESSAGE_MIN_CHARS) {
            errors.insert(FormField::Message, e);
        }
        if !self.agreed_to_terms {
            errors.insert(FormField::AgreedToTerms, FieldError::MustAgree);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn check_min_len(value: &str, min: usize) -> Option<FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Some(FieldError::Required)
    } else if trimmed.chars().count() < min {
        Some(FieldError::TooShort { min })
    } else {
        None
    }
}

/// Address check shared by the form and the relay: a dot-atom local part, `@`, and a domain of
/// at least two DNS labels.
pub fn is_valid_email(address: &str) -> bool {
    let Some((local, domain)) = address.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.len() > 253 {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c));
    if !local_ok {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Name,
    Email,
    Message,
    AgreedToTerms,
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
            Self::AgreedToTerms => "agreedToTerms",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    Required,
    TooShort { min: usize },
    InvalidEmail,
    MustAgree,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required => f.write_str("is required"),
            Self::TooShort { min } => write!(f, "needs at least {min} characters"),
            Self::InvalidEmail => f.write_str("is not a valid e-mail address"),
            Self::MustAgree => f.write_str("must be accepted"),
        }
    }
}

/// Per-field validation failures, at most one per field.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct FormErrors {
    errors: BTreeMap<FormField, FieldError>,
}

impl FormErrors {
    fn insert(&mut self, field: FormField, error: FieldError) {
        self.errors.insert(field, error);
    }

    pub fn get(&self, field: FormField) -> Option<FieldError> {
        self.errors.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, FieldError)> + '_ {
        self.errors.iter().map(|(k, v)| (*k, *v))
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (field, error)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field} {error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/contact/form.rs"]
mod tests;
