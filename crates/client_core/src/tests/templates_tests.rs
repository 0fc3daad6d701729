use super::*;

#[test]
fn catalog_has_eight_templates_in_order() {
    let templates = catalog();
    assert_eq!(templates.len(), 8);
    let ids: Vec<&str> = templates.iter().map(|t| t.id.0.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6", "7", "8"]);
    assert_eq!(templates[0].name, "Non-Disclosure Agreement (NDA)");
    assert_eq!(templates[7].name, "Software License");
    assert!(templates.iter().all(|t| !t.icon.is_empty()));
}

#[test]
fn nda_placeholders_are_listed_once() {
    let nda = find_template("1").expect("nda");
    assert!(nda.content.starts_with("MUTUAL NON-DISCLOSURE AGREEMENT"));
    assert_eq!(nda.placeholders(), vec!["[DATE]", "[PARTY A]", "[PARTY B]"]);
}

#[test]
fn every_template_carries_placeholders() {
    for template in catalog() {
        assert!(
            template.placeholders().contains(&"[DATE]"),
            "{} lacks a [DATE] placeholder",
            template.name
        );
    }
}

#[test]
fn lookup_accepts_ids_and_names() {
    assert_eq!(lookup(" 5 ").expect("lease").name, "Lease Agreement");
    assert_eq!(lookup("software license").expect("license").id.0, "8");
    assert!(lookup("9").is_none());
    assert!(find_template("Lease Agreement").is_none());
}
