use super::{
    file_extension, ImageUpload, MenuItemDraft, ValidationError, ValidationResult,
};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_ITEM_NAME_LENGTH: usize = 100;
pub const MAX_IMAGE_PATH_LENGTH: usize = 250;
pub const MIN_CART_QUANTITY: u32 = 1;
pub const MAX_CART_QUANTITY: u32 = 99;

impl Validate for MenuItemDraft {
    fn validate(&self) -> ValidationResult<()> {
        validate_item_name(&self.name)?;
        validate_item_price(self.price)?;
        Ok(())
    }
}

/// Validate item name
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "name".to_string(),
        });
    }

    let length = trimmed.chars().count();
    if length > MAX_ITEM_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max_length: MAX_ITEM_NAME_LENGTH,
            actual_length: length,
        });
    }

    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            value: name.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

/// Validate item price. Only finiteness is enforced; the sign is left to the operator.
pub fn validate_item_price(price: f64) -> ValidationResult<()> {
    if !price.is_finite() {
        return Err(ValidationError::InvalidValue {
            field: "price".to_string(),
            value: price.to_string(),
            reason: "Price must be a finite number".to_string(),
        });
    }

    Ok(())
}

/// Parse a submitted price field
pub fn parse_item_price(raw: &str) -> ValidationResult<f64> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "price".to_string(),
        });
    }

    let price = trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "price".to_string(),
            expected: "A decimal number such as 4.50".to_string(),
        })?;

    validate_item_price(price)?;
    Ok(price)
}

/// Validate an uploaded image against the allowed extensions
pub fn validate_image_upload(
    image: &ImageUpload,
    allowed_extensions: &[String],
) -> ValidationResult<()> {
    if image.file_name.trim().is_empty() || image.bytes.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "image".to_string(),
        });
    }

    let sanitized = image.sanitized_name();
    if sanitized.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "image".to_string(),
            value: image.file_name.clone(),
            reason: "File name has no usable characters".to_string(),
        });
    }

    let extension = file_extension(&sanitized).ok_or_else(|| ValidationError::InvalidFormat {
        field: "image".to_string(),
        expected: format!("A file name ending in .{}", allowed_extensions.join(", .")),
    })?;

    if !allowed_extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
    {
        return Err(ValidationError::UnsupportedFileType {
            extension,
            allowed: allowed_extensions.join(","),
        });
    }

    Ok(())
}

/// Validate the path that will be persisted for an image
pub fn validate_image_path(image_path: &str) -> ValidationResult<()> {
    if image_path.len() > MAX_IMAGE_PATH_LENGTH {
        return Err(ValidationError::TooLong {
            field: "image".to_string(),
            max_length: MAX_IMAGE_PATH_LENGTH,
            actual_length: image_path.len(),
        });
    }

    Ok(())
}

/// Validate cart quantity
pub fn validate_cart_quantity(quantity: u32) -> ValidationResult<()> {
    if !(MIN_CART_QUANTITY..=MAX_CART_QUANTITY).contains(&quantity) {
        return Err(ValidationError::InvalidValue {
            field: "quantity".to_string(),
            value: quantity.to_string(),
            reason: format!(
                "Quantity must be between {} and {}",
                MIN_CART_QUANTITY, MAX_CART_QUANTITY
            ),
        });
    }

    Ok(())
}
