//! Fixture definitions shared by the integration tests.
#![allow(dead_code)]

use fixturekit::prelude::*;
use fixturekit::inflect;
use serde_json::json;

fn entry_type_key(field: &str) -> String {
    format!("{}_id", inflect::underscore(field))
}

pub fn definitions() -> Vec<TypeDefinition> {
    vec![
        TypeDefinition::new("user")
            .sequence("name", |n| json!(format!("User{n}")))
            .attr("style", "normal")
            .attribute(AttributeInfo::new("info").custom(None))
            .relationship(RelationshipInfo::belongs_to("company", "company").polymorphic(true))
            .relationship(RelationshipInfo::has_many("hats", "hat").polymorphic(true))
            .with_trait(
                "with_company",
                Overrides::new().set("company", Fabricate::related()),
            )
            .with_trait(
                "with_hats",
                Overrides::new().set("hats", Fabricate::new("big-hat").times(2)),
            ),
        TypeDefinition::new("company")
            .attr("type", "Company")
            .attr("name", "Silly corp")
            .named("marvel", Overrides::new().set("name", "Marvel Comics")),
        TypeDefinition::new("hat")
            .attr("type", "Hat")
            .attribute(AttributeInfo::new("shape")),
        TypeDefinition::new("big-hat")
            .extends("hat")
            .attr("type", "BigHat")
            .attribute(AttributeInfo::new("shape"))
            .with_trait("square", Overrides::new().set("shape", "square")),
        TypeDefinition::new("project")
            .sequence("title", |n| json!(format!("Project{n}")))
            .relationship(RelationshipInfo::belongs_to("user", "user")),
        TypeDefinition::new("property")
            .attr("name", "Silly property")
            .relationship(RelationshipInfo::has_many("owners", "user")),
        TypeDefinition::new("profile")
            .attr("description", "Text goes here")
            .attr("camelCaseDescription", "textGoesHere")
            .attr("snake_case_description", "text_goes_here")
            .attr("aBooleanField", false)
            .attribute(AttributeInfo::new("created_at"))
            .relationship(RelationshipInfo::belongs_to("superHero", "super-hero"))
            .forbid("created_at")
            .with_trait(
                "with_bat_man",
                Overrides::new().set("superHero", Fabricate::new("bat_man")),
            )
            .with_trait(
                "with_created_at",
                Overrides::new().set("created_at", "2015-05-01T00:00:00.000Z"),
            ),
        TypeDefinition::new("super-hero")
            .attr("type", "SuperHero")
            .attr("name", "Super hero")
            .named("bat_man", Overrides::new().set("name", "BatMan")),
        TypeDefinition::new("comic-book")
            .sequence("name", |n| json!(format!("Comic Times #{n}")))
            .relationship(RelationshipInfo::belongs_to("company", "company").embedded())
            .relationship(RelationshipInfo::has_many("characters", "villain").embedded())
            .with_trait(
                "marvel",
                Overrides::new().set("company", Fabricate::new("marvel")),
            )
            .with_trait(
                "with_bad_guys",
                Overrides::new().set("characters", Fabricate::related().times(2)),
            ),
        TypeDefinition::new("villain")
            .attr("type", "Villain")
            .sequence("name", |n| json!(format!("BadGuy#{n}"))),
        TypeDefinition::new("manager")
            .relationship(
                RelationshipInfo::belongs_to("name", "name")
                    .embedded()
                    .default_value(Fabricate::related()),
            )
            .relationship(RelationshipInfo::belongs_to("salary", "salary").embedded())
            .relationship(RelationshipInfo::has_many("reviews", "review").embedded())
            .with_trait(
                "with_salary",
                Overrides::new().set("salary", Fabricate::related()),
            )
            .with_trait(
                "with_reviews",
                Overrides::new().set("reviews", Fabricate::related().times(2)),
            ),
        TypeDefinition::new("name")
            .fragment()
            .attr("firstName", "Tyrion")
            .attr("lastName", "Lannister"),
        TypeDefinition::new("salary")
            .attr("income", 90000)
            .attr("benefits", json!(["health", "company car", "dental"])),
        TypeDefinition::new("review")
            .sequence("rating", |n| json!(n))
            .attr("date", "2015-05-01T00:00:00.000Z"),
        TypeDefinition::new("cat")
            .primary_key("catId")
            .sequence("name", |n| json!(format!("Cat{n}"))),
        TypeDefinition::new("dog")
            .primary_key("dogNumber")
            .sequence("dogNumber", |n| json!(format!("Dog{n}")))
            .attr("sound", "Normal Bark"),
        TypeDefinition::new("billing-address")
            .fragment()
            .sequence("street", |n| json!(format!("{n} Sky Cell")))
            .attr("city", "Eyre")
            .attr("region", "Vale of Arryn")
            .attr("country", "Westeros")
            .sequence("billingAddressProperty", |n| json!(n)),
        TypeDefinition::new("entry-type")
            .attr("name", "Normal")
            .relationship(RelationshipInfo::has_many("entries", "entry")),
        TypeDefinition::new("entry")
            .sequence("title", |n| json!(format!("Entry{n}")))
            .relationship(
                RelationshipInfo::belongs_to("entryType", "entry-type").key(entry_type_key),
            ),
    ]
}

pub fn registry_with(config: FactoryConfig) -> SchemaRegistry {
    let mut registry = SchemaRegistry::new(config);
    for definition in definitions() {
        registry.define(definition);
    }
    registry
}

pub fn registry() -> SchemaRegistry {
    registry_with(FactoryConfig::default())
}

/// A REST-style fixture session.
pub fn factory() -> FactoryGuy {
    FactoryGuy::new(registry())
}

/// A JSON-API fixture session.
pub fn json_api_factory() -> FactoryGuy {
    FactoryGuy::new(registry_with(
        FactoryConfig::new().style(DocumentStyle::JsonApi),
    ))
}
