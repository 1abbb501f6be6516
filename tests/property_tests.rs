use bytes::Bytes;
use cafeteria_rs::models::{
    parse_item_price, secure_filename, validate_cart_quantity, validate_item_name, Category,
    ImageUpload, MenuItem, MenuItemDraft, MenuView,
};
use proptest::prelude::*;

// Property-based test strategies
prop_compose! {
    fn arb_category()(category in prop_oneof![
        Just(Category::Food),
        Just(Category::Beverage),
    ]) -> Category {
        category
    }
}

prop_compose! {
    fn arb_valid_item_name()(name in "[a-zA-ZÀ-ú0-9 ]{0,98}[a-zA-Z]") -> String {
        name
    }
}

prop_compose! {
    fn arb_menu_item()(
        id in 1i64..100_000,
        name in arb_valid_item_name(),
        cents in -10_000i64..100_000,
        category in arb_category(),
    ) -> MenuItem {
        MenuItem::from_draft(
            id,
            MenuItemDraft::new(name, cents as f64 / 100.0, category),
            format!("static/uploads/item-{}.png", id),
        )
    }
}

proptest! {
    #[test]
    fn test_secure_filename_is_flat_and_safe(name in "\\PC{0,64}") {
        let sanitized = secure_filename(&name);

        prop_assert!(!sanitized.contains('/'));
        prop_assert!(!sanitized.contains('\\'));
        prop_assert!(!sanitized.starts_with('.'));
        prop_assert!(sanitized != "..");
        prop_assert!(sanitized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')));
    }

    #[test]
    fn test_secure_filename_is_idempotent(name in "[a-zA-Z0-9 ._/\\\\çãé-]{0,40}") {
        let once = secure_filename(&name);
        prop_assert_eq!(secure_filename(&once), once);
    }

    #[test]
    fn test_traversal_attempts_stay_in_place(
        depth in 1usize..6,
        stem in "[a-z]{1,12}",
    ) {
        let name = format!("{}{}.png", "../".repeat(depth), stem);
        let sanitized = secure_filename(&name);
        prop_assert!(!sanitized.contains(".."));
        let expected = format!("{}.png", stem);
        prop_assert!(sanitized.ends_with(&expected));
    }

    #[test]
    fn test_stored_file_name_is_prefixed(stem in "[a-z]{1,20}", content in prop::collection::vec(any::<u8>(), 1..64)) {
        // Reserved device names get an extra prefix
        prop_assume!(!["con", "aux", "nul", "prn"].contains(&stem.as_str()));
        let upload = ImageUpload::new(format!("{}.jpg", stem), None, Bytes::from(content));
        let stored = upload.stored_file_name();

        let (prefix, rest) = stored.split_once('_').unwrap();
        prop_assert!(prefix.chars().all(|c| c.is_ascii_hexdigit()));
        let expected = format!("{}.jpg", stem);
        prop_assert_eq!(rest, expected.as_str());
    }

    #[test]
    fn test_category_code_round_trip(category in arb_category()) {
        prop_assert_eq!(Category::from_code(category.code()), Some(category));
        prop_assert_eq!(category.code().parse::<Category>().unwrap(), category);
    }

    #[test]
    fn test_unknown_category_codes_are_rejected(code in "[03-9]|[a-z]{2,6}") {
        prop_assert!(Category::from_code(&code).is_none());
    }

    #[test]
    fn test_valid_names_are_accepted(name in arb_valid_item_name()) {
        prop_assert!(validate_item_name(&name).is_ok());
    }

    #[test]
    fn test_blank_names_are_rejected(name in "[ \\t]{0,10}") {
        prop_assert!(validate_item_name(&name).is_err());
    }

    #[test]
    fn test_overlong_names_are_rejected(name in "[a-z]{101,150}") {
        prop_assert!(validate_item_name(&name).is_err());
    }

    #[test]
    fn test_finite_prices_parse(price in -1.0e6f64..1.0e6) {
        let parsed = parse_item_price(&price.to_string()).unwrap();
        prop_assert_eq!(parsed, price);
    }

    #[test]
    fn test_cart_quantity_bounds(quantity in 0u32..200) {
        let result = validate_cart_quantity(quantity);
        prop_assert_eq!(result.is_ok(), (1..=99).contains(&quantity));
    }

    #[test]
    fn test_menu_view_partitions_every_item(items in prop::collection::vec(arb_menu_item(), 0..40)) {
        let view = MenuView::from_items(items.clone());

        prop_assert_eq!(view.len(), items.len());
        prop_assert!(view.foods.iter().all(|item| item.category == Category::Food));
        prop_assert!(view.beverages.iter().all(|item| item.category == Category::Beverage));

        // Relative order inside each category is preserved
        let expected_foods: Vec<_> = items
            .iter()
            .filter(|item| item.category == Category::Food)
            .cloned()
            .collect();
        prop_assert_eq!(view.foods, expected_foods);
    }
}
