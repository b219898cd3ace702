/// Minimum password length accepted by the sign-up form
pub const MIN_PASSWORD_LEN: usize = 6;

/// Form input rejected before anything is sent to a service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Todo title cannot be empty")]
    EmptyTitle,
    #[error("Email is required")]
    EmptyEmail,
    #[error("Password is required")]
    EmptyPassword,
    #[error("Passwords don't match")]
    PasswordMismatch,
    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,
}

/// Trimmed title, or `EmptyTitle` when nothing is left
pub fn todo_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(title.to_string())
}

/// Sign-in form: both fields present. Returns the trimmed email.
pub fn sign_in_form(email: &str, password: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmptyEmail);
    }
    if password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    Ok(email.to_string())
}

/// Sign-up form: sign-in checks plus confirmation and length
pub fn sign_up_form(
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<String, ValidationError> {
    let email = sign_in_form(email, password)?;
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(email)
}
