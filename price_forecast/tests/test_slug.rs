use price_forecast::slug::{slugify, transliterate};
use rstest::rstest;

#[rstest]
#[case("Хлеб ржаной, кг", "hleb-rzhanoi-kg")]
#[case("Молоко пастеризованное 2,5-3,2% жирности, л", "moloko-pasterizovannoe-25-32-zhirnosti-l")]
#[case("Яйца куриные, 10 шт.", "jaica-kurinye-10-sht")]
#[case("Щи, порция", "sczi-porcija")]
#[case("Fresh  Apples -- Red", "fresh-apples-red")]
#[case("snake_case label", "snake_case-label")]
#[case("  padded  ", "padded")]
#[case("!!!", "")]
fn test_slugify(#[case] label: &str, #[case] expected: &str) {
    assert_eq!(slugify(label), expected);
}

#[test]
fn test_slugify_is_idempotent() {
    for label in ["Хлеб ржаной, кг", "Масло сливочное, 1 кг", "Tea (black) - 100g"] {
        let once = slugify(label);
        assert_eq!(slugify(&once), once);
    }
}

#[test]
fn test_transliterate_keeps_latin() {
    assert_eq!(transliterate("чай tea"), "czai tea");
    assert_eq!(transliterate("объём"), "obem");
}
