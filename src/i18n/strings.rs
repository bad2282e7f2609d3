use serde::Serialize;

/// All localized user-facing strings for a language
///
/// Templates may contain `{field}`, `{min}` and `{max}` placeholders which are
/// substituted with [`fill`]. The whole table is also served to the front end.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageStrings {
    // ==================== Account Flash Messages ====================
    pub registered: &'static str,
    pub logged_out: &'static str,
    pub reset_link_sent: &'static str,
    pub password_reset: &'static str,
    pub email_verified: &'static str,
    pub verification_link_sent: &'static str,
    pub password_confirmed: &'static str,
    pub password_updated: &'static str,
    pub profile_updated: &'static str,
    pub photo_updated: &'static str,
    pub account_deleted: &'static str,

    // ==================== Listing Flash Messages ====================
    pub property_created: &'static str,
    pub property_updated: &'static str,
    pub property_deleted: &'static str,
    pub images_uploaded: &'static str,
    pub contact_sent: &'static str,
    pub favorite_added: &'static str,
    pub favorite_removed: &'static str,

    // ==================== Admin Flash Messages ====================
    pub settings_updated: &'static str,
    pub role_updated: &'static str,

    // ==================== Request Errors ====================
    pub credentials_mismatch: &'static str,
    pub invalid_reset_token: &'static str,
    pub invalid_verification_link: &'static str,
    pub unauthenticated: &'static str,
    pub forbidden: &'static str,
    pub not_found: &'static str,
    pub email_not_verified: &'static str,
    pub password_confirmation_required: &'static str,
    pub malformed_request: &'static str,

    // ==================== Validation Messages ====================
    /// Placeholders: {field}
    pub field_required: &'static str,
    /// Placeholders: {field}
    pub field_email: &'static str,
    /// Placeholders: {field}, {min}
    pub field_min: &'static str,
    /// Placeholders: {field}, {max}
    pub field_max: &'static str,
    /// Placeholders: {field}
    pub field_confirmed: &'static str,
    /// Placeholders: {field}
    pub field_in: &'static str,
    /// Placeholders: {field}, {min}, {max}
    pub field_between: &'static str,
    /// Placeholders: {field}
    pub field_url: &'static str,
    /// Placeholders: {field}
    pub field_integer: &'static str,
    /// Placeholders: {field}
    pub field_unique: &'static str,
    pub current_password: &'static str,
    /// Placeholders: {field}, {max} (kilobytes)
    pub file_too_large: &'static str,
    /// Placeholders: {field}
    pub file_type: &'static str,

    // ==================== Password Strength Labels ====================
    pub strength_very_weak: &'static str,
    pub strength_weak: &'static str,
    pub strength_fair: &'static str,
    pub strength_strong: &'static str,
    pub strength_very_strong: &'static str,
}

/// Substitute `{name}` placeholders in a template.
pub fn fill(template: &str, params: &[(&str, String)]) -> String {
    params.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}

// ==================== English Strings ====================

/// English language strings (canonical)
pub const ENGLISH_STRINGS: LanguageStrings = LanguageStrings {
    registered: "Welcome! Your account has been created.",
    logged_out: "You have been logged out.",
    reset_link_sent: "If that email address is registered, we have emailed you a password reset link.",
    password_reset: "Your password has been reset. Please log in.",
    email_verified: "Your email address has been verified.",
    verification_link_sent: "A new verification link has been sent to your email address.",
    password_confirmed: "Password confirmed.",
    password_updated: "Your password has been updated.",
    profile_updated: "Profile updated.",
    photo_updated: "Profile photo updated.",
    account_deleted: "Your account has been deleted.",

    property_created: "Property created.",
    property_updated: "Property updated.",
    property_deleted: "Property deleted.",
    images_uploaded: "Images uploaded.",
    contact_sent: "Your message has been sent to the owner.",
    favorite_added: "Added to favorites.",
    favorite_removed: "Removed from favorites.",

    settings_updated: "Settings saved.",
    role_updated: "Role updated.",

    credentials_mismatch: "These credentials do not match our records.",
    invalid_reset_token: "This password reset token is invalid.",
    invalid_verification_link: "This verification link is invalid.",
    unauthenticated: "Unauthenticated.",
    forbidden: "This action is unauthorized.",
    not_found: "Not found.",
    email_not_verified: "Your email address is not verified.",
    password_confirmation_required: "Password confirmation required.",
    malformed_request: "The request could not be read.",

    field_required: "The {field} field is required.",
    field_email: "The {field} field must be a valid email address.",
    field_min: "The {field} field must be at least {min} characters.",
    field_max: "The {field} field must not be greater than {max} characters.",
    field_confirmed: "The {field} field confirmation does not match.",
    field_in: "The selected {field} is invalid.",
    field_between: "The {field} field must be between {min} and {max}.",
    field_url: "The {field} field must be a valid URL.",
    field_integer: "The {field} field must be an integer.",
    field_unique: "The {field} has already been taken.",
    current_password: "The password is incorrect.",
    file_too_large: "The {field} must not be greater than {max} kilobytes.",
    file_type: "The {field} must be a file of type: jpeg, png, webp.",

    strength_very_weak: "Very weak",
    strength_weak: "Weak",
    strength_fair: "Fair",
    strength_strong: "Strong",
    strength_very_strong: "Very strong",
};

// ==================== Spanish Strings ====================

/// Spanish language strings
pub const SPANISH_STRINGS: LanguageStrings = LanguageStrings {
    registered: "¡Bienvenido! Tu cuenta ha sido creada.",
    logged_out: "Has cerrado sesión.",
    reset_link_sent: "Si esa dirección está registrada, te hemos enviado un enlace para restablecer la contraseña.",
    password_reset: "Tu contraseña ha sido restablecida. Inicia sesión.",
    email_verified: "Tu correo electrónico ha sido verificado.",
    verification_link_sent: "Se ha enviado un nuevo enlace de verificación a tu correo electrónico.",
    password_confirmed: "Contraseña confirmada.",
    password_updated: "Tu contraseña ha sido actualizada.",
    profile_updated: "Perfil actualizado.",
    photo_updated: "Foto de perfil actualizada.",
    account_deleted: "Tu cuenta ha sido eliminada.",

    property_created: "Propiedad creada.",
    property_updated: "Propiedad actualizada.",
    property_deleted: "Propiedad eliminada.",
    images_uploaded: "Imágenes subidas.",
    contact_sent: "Tu mensaje ha sido enviado al propietario.",
    favorite_added: "Añadido a favoritos.",
    favorite_removed: "Eliminado de favoritos.",

    settings_updated: "Configuración guardada.",
    role_updated: "Rol actualizado.",

    credentials_mismatch: "Estas credenciales no coinciden con nuestros registros.",
    invalid_reset_token: "El token de restablecimiento de contraseña no es válido.",
    invalid_verification_link: "El enlace de verificación no es válido.",
    unauthenticated: "No autenticado.",
    forbidden: "Esta acción no está autorizada.",
    not_found: "No encontrado.",
    email_not_verified: "Tu correo electrónico no está verificado.",
    password_confirmation_required: "Se requiere confirmar la contraseña.",
    malformed_request: "No se pudo leer la solicitud.",

    field_required: "El campo {field} es obligatorio.",
    field_email: "El campo {field} debe ser un correo electrónico válido.",
    field_min: "El campo {field} debe tener al menos {min} caracteres.",
    field_max: "El campo {field} no debe tener más de {max} caracteres.",
    field_confirmed: "La confirmación del campo {field} no coincide.",
    field_in: "El {field} seleccionado no es válido.",
    field_between: "El campo {field} debe estar entre {min} y {max}.",
    field_url: "El campo {field} debe ser una URL válida.",
    field_integer: "El campo {field} debe ser un número entero.",
    field_unique: "El valor del campo {field} ya está en uso.",
    current_password: "La contraseña es incorrecta.",
    file_too_large: "El archivo {field} no debe pesar más de {max} kilobytes.",
    file_type: "El archivo {field} debe ser de tipo: jpeg, png, webp.",

    strength_very_weak: "Muy débil",
    strength_weak: "Débil",
    strength_fair: "Aceptable",
    strength_strong: "Fuerte",
    strength_very_strong: "Muy fuerte",
};
