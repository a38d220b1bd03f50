mod common;

use fixturekit::prelude::*;
use serde::Deserialize;
use serde_json::json;

#[test]
fn get_returns_attributes_with_sequential_ids() {
    let mut fg = common::factory();
    let user = fg.build("user").unwrap();

    assert_eq!(user.get("id"), Some(json!(1)));
    assert_eq!(user.get("name"), Some(json!("User1")));
    assert_eq!(
        user.to_value(),
        json!({ "id": 1, "name": "User1", "style": "normal" })
    );

    let second = fg.build("user").unwrap();
    assert_eq!(second.get("name"), Some(json!("User2")));
    assert_eq!(second.get("missing"), None);
}

#[test]
fn get_renders_polymorphic_belongs_to_as_stub() {
    let mut fg = common::factory();
    let user = fg.build_with("user", &["with_company"], Overrides::new()).unwrap();

    assert_eq!(user.get("company"), Some(json!({ "id": 1, "type": "company" })));
}

#[test]
fn list_get_reads_by_index() {
    let mut fg = common::factory();
    let users = fg
        .build_list_with("user", 2, &["with_company"], Overrides::new())
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users.ids(), vec![json!(1), json!(2)]);
    assert_eq!(users.get_field(1, "company"), Some(json!({ "id": 2, "type": "company" })));
    assert_eq!(users.get_field(0, "name"), Some(json!("User1")));
    assert_eq!(users.get(5), None);

    let all = users.get_all();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1]["name"], json!("User2"));
}

#[test]
fn fragments_have_no_id() {
    let mut fg = common::factory();
    let addresses = fg.build_list("billing-address", 2).unwrap();

    assert_eq!(
        addresses.get(0),
        Some(json!({
            "street": "1 Sky Cell",
            "city": "Eyre",
            "region": "Vale of Arryn",
            "country": "Westeros",
            "billingAddressProperty": 1
        }))
    );
    assert_eq!(addresses.get_field(1, "street"), Some(json!("2 Sky Cell")));
    assert!(addresses.ids().is_empty());
}

#[test]
fn custom_primary_key_is_generated_or_taken_from_overrides() {
    let mut fg = common::factory();

    let cat = fg.build("cat").unwrap();
    assert_eq!(cat.get("id"), Some(json!(1)));
    assert_eq!(cat.get("catId"), Some(json!(1)));

    let named = fg
        .build_with("cat", &[], Overrides::new().set("catId", "meow1"))
        .unwrap();
    assert_eq!(named.get("id"), Some(json!("meow1")));

    // A supplied key does not advance the counter.
    let next = fg.build("cat").unwrap();
    assert_eq!(next.get("id"), Some(json!(2)));
}

#[test]
fn primary_key_attribute_default_becomes_the_id() {
    let mut fg = common::factory();
    let dog = fg.build("dog").unwrap();

    assert_eq!(dog.get("id"), Some(json!("Dog1")));
    assert_eq!(dog.get("dogNumber"), Some(json!("Dog1")));
    assert_eq!(dog.get("sound"), Some(json!("Normal Bark")));
}

#[test]
fn forbidden_fields_remain_readable() {
    let mut fg = common::factory();
    let date = "2016-01-01T00:00:00.000Z";
    let profile = fg
        .build_with(
            "profile",
            &["with_created_at"],
            Overrides::new().set("created_at", date),
        )
        .unwrap();

    assert_eq!(profile.get("created_at"), Some(json!(date)));
    assert!(profile.unwrap()["profile"].get("created_at").is_none());
}

#[test]
fn overrides_win_over_traits_and_named_presets() {
    let mut fg = common::factory();
    let hero = fg
        .build_with("bat_man", &[], Overrides::new().set("name", "Robin"))
        .unwrap();

    assert_eq!(hero.type_name(), "super-hero");
    assert_eq!(hero.get("name"), Some(json!("Robin")));
    assert_eq!(hero.get("type"), Some(json!("SuperHero")));
}

#[test]
fn overrides_from_json_build_nested_records() {
    let mut fg = common::factory();
    let overrides = Overrides::from_json(json!({
        "title": "Launch",
        "user": { "name": "Dude" }
    }))
    .unwrap();
    let project = fg.build_with("project", &[], overrides).unwrap();

    assert_eq!(project.get("title"), Some(json!("Launch")));
    assert_eq!(project.get("user"), Some(json!(1)));
    assert_eq!(
        project.unwrap()["users"],
        json!([{ "id": 1, "name": "Dude", "style": "normal" }])
    );
}

#[test]
fn list_each_applies_one_override_set_per_record() {
    let mut fg = common::factory();
    let users = fg
        .build_list_each(
            "user",
            vec![
                Overrides::new().set("name", "Alice"),
                Overrides::new().set("style", "fancy"),
            ],
        )
        .unwrap();

    assert_eq!(users.get_field(0, "name"), Some(json!("Alice")));
    assert_eq!(users.get_field(1, "name"), Some(json!("User1")));
    assert_eq!(users.get_field(1, "style"), Some(json!("fancy")));
}

#[derive(Debug, Deserialize, PartialEq)]
struct Salary {
    id: u64,
    income: u64,
    benefits: Vec<String>,
}

#[test]
fn results_deserialize_into_structs() {
    let mut fg = common::factory();
    let salary = fg.build("salary").unwrap();
    assert_eq!(
        salary.deserialize::<Salary>().unwrap(),
        Salary {
            id: 1,
            income: 90000,
            benefits: vec!["health".into(), "company car".into(), "dental".into()],
        }
    );

    let salaries = fg.build_list("salary", 2).unwrap();
    let ids: Vec<u64> = salaries
        .deserialize_all::<Salary>()
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn reset_restarts_ids_and_sequences() {
    let mut fg = common::factory();
    fg.build_list("user", 3).unwrap();
    fg.reset();

    let user = fg.build("user").unwrap();
    assert_eq!(user.get("id"), Some(json!(1)));
    assert_eq!(user.get("name"), Some(json!("User1")));
}
