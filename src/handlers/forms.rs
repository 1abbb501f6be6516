use axum::extract::multipart::{Multipart, MultipartError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::models::{
    parse_item_price, validate_image_upload, validate_item_name, Category, ImageUpload, MenuItem,
    MenuItemDraft, ValidationError,
};
use crate::security::{CsrfError, CsrfGuard};

/// Raw registration/edit form submission
#[derive(Debug, Default)]
pub struct ItemFormInput {
    pub nome: String,
    pub preco: String,
    pub categoria: String,
    pub csrf_token: String,
    pub imagem: Option<ImageUpload>,
}

/// Values echoed back into the form when it is re-rendered
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemFormValues {
    pub nome: String,
    pub preco: String,
    pub categoria: String,
}

/// Url-encoded cart form
#[derive(Debug, Deserialize)]
pub struct CartForm {
    #[serde(default)]
    pub quantidade: String,
    #[serde(default)]
    pub csrf_token: String,
}

impl ItemFormInput {
    /// Read every known field from a multipart body; unknown fields are skipped
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut input = ItemFormInput::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "nome" => input.nome = field.text().await?,
                "preco" => input.preco = field.text().await?,
                "categoria" => input.categoria = field.text().await?,
                "csrf_token" => input.csrf_token = field.text().await?,
                "imagem" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part when no file was chosen
                    if !file_name.is_empty() || !bytes.is_empty() {
                        input.imagem = Some(ImageUpload::new(file_name, content_type, bytes));
                    }
                }
                other => {
                    debug!(field = %other, "Ignoring unknown form field");
                }
            }
        }

        Ok(input)
    }

    pub fn values(&self) -> ItemFormValues {
        ItemFormValues {
            nome: self.nome.clone(),
            preco: self.preco.clone(),
            categoria: self.categoria.clone(),
        }
    }

    /// Validate every field, collecting all user-facing messages
    pub fn validate(
        self,
        csrf: &CsrfGuard,
        allowed_extensions: &[String],
    ) -> Result<(MenuItemDraft, ImageUpload), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = csrf.verify(&self.csrf_token) {
            errors.push(csrf_message(&e));
        }

        if let Err(e) = validate_item_name(&self.nome) {
            errors.push(validation_message(&e));
        }

        let price = match parse_item_price(&self.preco.replace(',', ".")) {
            Ok(price) => Some(price),
            Err(e) => {
                errors.push(validation_message(&e));
                None
            }
        };

        let category = match parse_category(&self.categoria) {
            Ok(category) => Some(category),
            Err(e) => {
                errors.push(validation_message(&e));
                None
            }
        };

        let image = match self.imagem {
            Some(image) => match validate_image_upload(&image, allowed_extensions) {
                Ok(()) => Some(image),
                Err(e) => {
                    errors.push(validation_message(&e));
                    None
                }
            },
            None => {
                errors.push(validation_message(&ValidationError::RequiredField {
                    field: "image".to_string(),
                }));
                None
            }
        };

        match (price, category, image) {
            (Some(price), Some(category), Some(image)) if errors.is_empty() => Ok((
                MenuItemDraft::new(self.nome.trim(), price, category),
                image,
            )),
            _ => Err(errors),
        }
    }
}

impl ItemFormValues {
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            nome: item.name.clone(),
            preco: format!("{:.2}", item.price),
            categoria: item.category.code().to_string(),
        }
    }
}

impl CartForm {
    pub fn quantity(&self) -> Result<u32, String> {
        self.quantidade
            .trim()
            .parse::<u32>()
            .map_err(|_| "Quantidade: informe um número inteiro.".to_string())
    }
}

fn parse_category(raw: &str) -> Result<Category, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::RequiredField {
            field: "category".to_string(),
        });
    }

    Category::from_str(raw).map_err(|reason| ValidationError::InvalidValue {
        field: "category".to_string(),
        value: raw.to_string(),
        reason,
    })
}

fn field_label(field: &str) -> &str {
    match field {
        "name" => "Nome",
        "price" => "Preço",
        "category" => "Categoria",
        "image" => "Imagem",
        "quantity" => "Quantidade",
        other => other,
    }
}

/// Portuguese message for a field-level validation failure
pub fn validation_message(error: &ValidationError) -> String {
    let label = field_label(error.field());
    match error {
        ValidationError::RequiredField { .. } => format!("{}: campo obrigatório.", label),
        ValidationError::InvalidValue { field, .. } if field == "category" => {
            format!("{}: escolha Comidas ou Bebidas.", label)
        }
        ValidationError::InvalidValue { field, .. } if field == "quantity" => {
            format!("{}: informe um valor entre 1 e 99.", label)
        }
        ValidationError::InvalidValue { reason, .. } => format!("{}: {}", label, reason),
        ValidationError::TooLong { max_length, .. } => {
            format!("{}: máximo de {} caracteres.", label, max_length)
        }
        ValidationError::InvalidFormat { field, .. } if field == "price" => {
            format!("{}: informe um número, por exemplo 4,50.", label)
        }
        ValidationError::InvalidFormat { expected, .. } => {
            format!("{}: formato inválido ({}).", label, expected)
        }
        ValidationError::UnsupportedFileType { extension, allowed } => format!(
            "{}: extensão .{} não permitida (permitidas: {}).",
            label, extension, allowed
        ),
    }
}

pub fn csrf_message(error: &CsrfError) -> String {
    match error {
        CsrfError::Expired => "O formulário expirou. Recarregue a página e tente novamente.".to_string(),
        _ => "Token de formulário inválido. Recarregue a página e tente novamente.".to_string(),
    }
}
