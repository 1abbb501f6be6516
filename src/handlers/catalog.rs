use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use tracing::{info, instrument, warn};

use crate::handlers::forms::{
    csrf_message, validation_message, CartForm, ItemFormInput, ItemFormValues,
};
use crate::handlers::pages::AppState;
use crate::models::{validate_cart_quantity, MenuItem, ServiceError};
use crate::views::{category_options, ItemCard};

/// Flask-style integer ids: anything else is an unknown page
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok()
}

fn unknown_item(state: &AppState, raw: &str) -> Response {
    state.not_found_page(&format!("O item {} não existe.", raw))
}

fn render_item_form(
    state: &AppState,
    view: &str,
    values: &ItemFormValues,
    errors: &[String],
    item: Option<&MenuItem>,
    status: StatusCode,
) -> Response {
    let mut context = state.context("cadastro");
    context.insert("values", values);
    context.insert("errors", errors);
    context.insert("categories", &category_options());
    context.insert("csrf_token", &state.csrf.generate());
    if let Some(item) = item {
        context.insert("item", &ItemCard::new(item, &state.assets_base_url));
    }
    state.render(view, &context, status)
}

async fn read_form(multipart: Multipart) -> Result<ItemFormInput, Response> {
    ItemFormInput::from_multipart(multipart).await.map_err(|e| {
        warn!(error = %e, "Malformed multipart body");
        e.into_response()
    })
}

/// Registration form
#[instrument(name = "cadastro_form", skip(state))]
pub async fn cadastro_form(State(state): State<AppState>) -> Response {
    render_item_form(
        &state,
        "cadastro",
        &ItemFormValues::default(),
        &[],
        None,
        StatusCode::OK,
    )
}

/// Register a new item
#[instrument(name = "cadastro_submit", skip(state, multipart))]
pub async fn cadastro_submit(State(state): State<AppState>, multipart: Multipart) -> Response {
    let input = match read_form(multipart).await {
        Ok(input) => input,
        Err(response) => return response,
    };
    let values = input.values();

    let (draft, image) =
        match input.validate(&state.csrf, state.menu_service.allowed_extensions()) {
            Ok(parsed) => parsed,
            Err(errors) => {
                info!(errors = errors.len(), "Registration form rejected");
                return render_item_form(
                    &state,
                    "cadastro",
                    &values,
                    &errors,
                    None,
                    StatusCode::UNPROCESSABLE_ENTITY,
                );
            }
        };

    match state.menu_service.create_item(draft, image).await {
        Ok(item) => {
            info!(id = item.id, "Item registered, redirecting to the menu");
            Redirect::to("/cardapio").into_response()
        }
        Err(ServiceError::ValidationError { message }) => render_item_form(
            &state,
            "cadastro",
            &values,
            &[message],
            None,
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        Err(err) => state.error_page(&err),
    }
}

/// Admin listing of every item
#[instrument(name = "listagem", skip(state))]
pub async fn listagem(State(state): State<AppState>) -> Response {
    match state.menu_service.list_items().await {
        Ok(items) => {
            let mut context = state.context("listagem");
            context.insert("items", &ItemCard::from_items(&items, &state.assets_base_url));
            state.render("listagem", &context, StatusCode::OK)
        }
        Err(err) => state.error_page(&err),
    }
}

/// Edit form pre-filled with the stored values
#[instrument(name = "editar_form", skip(state))]
pub async fn editar_form(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let Some(id) = parse_id(&raw_id) else {
        return unknown_item(&state, &raw_id);
    };

    match state.menu_service.get_item(id).await {
        Ok(item) => render_item_form(
            &state,
            "editar",
            &ItemFormValues::from_item(&item),
            &[],
            Some(&item),
            StatusCode::OK,
        ),
        Err(err) => state.error_page(&err),
    }
}

/// Overwrite an item
#[instrument(name = "editar_submit", skip(state, multipart))]
pub async fn editar_submit(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    multipart: Multipart,
) -> Response {
    let Some(id) = parse_id(&raw_id) else {
        return unknown_item(&state, &raw_id);
    };

    let current = match state.menu_service.get_item(id).await {
        Ok(item) => item,
        Err(err) => return state.error_page(&err),
    };

    let input = match read_form(multipart).await {
        Ok(input) => input,
        Err(response) => return response,
    };
    let values = input.values();

    let (draft, image) =
        match input.validate(&state.csrf, state.menu_service.allowed_extensions()) {
            Ok(parsed) => parsed,
            Err(errors) => {
                info!(errors = errors.len(), "Edit form rejected");
                return render_item_form(
                    &state,
                    "editar",
                    &values,
                    &errors,
                    Some(&current),
                    StatusCode::UNPROCESSABLE_ENTITY,
                );
            }
        };

    match state.menu_service.update_item(id, draft, image).await {
        Ok(_) => Redirect::to("/listagem").into_response(),
        Err(ServiceError::ValidationError { message }) => render_item_form(
            &state,
            "editar",
            &values,
            &[message],
            Some(&current),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        Err(err) => state.error_page(&err),
    }
}

/// Delete an item and return to the listing
#[instrument(name = "excluir", skip(state))]
pub async fn excluir(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let Some(id) = parse_id(&raw_id) else {
        return unknown_item(&state, &raw_id);
    };

    match state.menu_service.delete_item(id).await {
        Ok(()) => Redirect::to("/listagem").into_response(),
        Err(err) => state.error_page(&err),
    }
}

/// Public menu split into foods and beverages
#[instrument(name = "cardapio", skip(state))]
pub async fn cardapio(State(state): State<AppState>) -> Response {
    match state.menu_service.menu_view().await {
        Ok(view) => {
            let mut context = state.context("cardapio");
            context.insert(
                "foods",
                &ItemCard::from_items(&view.foods, &state.assets_base_url),
            );
            context.insert(
                "beverages",
                &ItemCard::from_items(&view.beverages, &state.assets_base_url),
            );
            state.render("cardapio", &context, StatusCode::OK)
        }
        Err(err) => state.error_page(&err),
    }
}

fn render_cart(
    state: &AppState,
    item: &MenuItem,
    quantity: Option<u32>,
    subtotal: Option<f64>,
    errors: &[String],
    status: StatusCode,
) -> Response {
    let mut context = state.context("cardapio");
    context.insert("item", &ItemCard::new(item, &state.assets_base_url));
    context.insert("quantity", &quantity.unwrap_or(1));
    context.insert("confirmed", &subtotal.is_some());
    if let Some(subtotal) = subtotal {
        context.insert("subtotal", &crate::views::format_price(subtotal));
    }
    context.insert("errors", errors);
    context.insert("csrf_token", &state.csrf.generate());
    state.render("carrinho", &context, status)
}

/// Single-item cart page
#[instrument(name = "carrinho", skip(state))]
pub async fn carrinho(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let Some(id) = parse_id(&raw_id) else {
        return unknown_item(&state, &raw_id);
    };

    match state.menu_service.get_item(id).await {
        Ok(item) => render_cart(&state, &item, None, None, &[], StatusCode::OK),
        Err(err) => state.error_page(&err),
    }
}

/// Choose a quantity and show the subtotal
#[instrument(name = "carrinho_submit", skip(state, form))]
pub async fn carrinho_submit(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Form(form): Form<CartForm>,
) -> Response {
    let Some(id) = parse_id(&raw_id) else {
        return unknown_item(&state, &raw_id);
    };

    let item = match state.menu_service.get_item(id).await {
        Ok(item) => item,
        Err(err) => return state.error_page(&err),
    };

    let mut errors = Vec::new();
    if let Err(e) = state.csrf.verify(&form.csrf_token) {
        errors.push(csrf_message(&e));
    }
    let quantity = match form.quantity() {
        Ok(quantity) => match validate_cart_quantity(quantity) {
            Ok(()) => Some(quantity),
            Err(e) => {
                errors.push(validation_message(&e));
                None
            }
        },
        Err(message) => {
            errors.push(message);
            None
        }
    };

    let quantity = match quantity {
        Some(quantity) if errors.is_empty() => quantity,
        _ => {
            return render_cart(
                &state,
                &item,
                None,
                None,
                &errors,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
    };

    match state.menu_service.cart_line(id, quantity).await {
        Ok(line) => render_cart(
            &state,
            &line.item,
            Some(line.quantity),
            Some(line.subtotal),
            &[],
            StatusCode::OK,
        ),
        Err(err) => state.error_page(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("-1"), Some(-1));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("4.2"), None);
    }
}
