mod common;

use chrono::{Duration, Utc};
use common::{Fixture, USER};
use metadata_service::builders::PropertyFacetBuilder;
use metadata_service::domain::{
    ActivityType, ArchiveProperties, GlossaryTermProperties, InstanceStatus, TemplateProperties,
    TermRelationshipProperties, TermRelationshipStatus,
};
use metadata_service::handlers::SearchOptions;
use metadata_service::types::{EntityTypeName, RelationshipTypeName};
use uuid::Uuid;

fn term(qualified_name: &str, display_name: &str) -> GlossaryTermProperties {
    GlossaryTermProperties {
        qualified_name: Some(qualified_name.to_string()),
        display_name: Some(display_name.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_and_read_term() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;

    let properties = GlossaryTermProperties {
        summary: Some("A party that buys goods".to_string()),
        aliases: vec!["Client".to_string()],
        ..term("Term::Customer", "Customer")
    };
    let guid = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &properties, None, Some(InstanceStatus::Draft))
        .await
        .unwrap();

    let element = fixture.glossary_terms.get_term_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.header.guid, guid);
    assert_eq!(element.header.type_name, "GlossaryTerm");
    assert_eq!(element.header.status, InstanceStatus::Draft);
    assert_eq!(element.glossary_guid, Some(glossary));
    assert_eq!(element.properties.summary.as_deref(), Some("A party that buys goods"));
    assert_eq!(element.properties.aliases, vec!["Client"]);

    let anchor = element.header.anchor.expect("term is anchored");
    assert_eq!(anchor.anchor_guid, glossary);
    assert_eq!(anchor.anchor_scope_guid, Some(glossary));
}

#[tokio::test]
async fn test_create_term_in_missing_glossary_fails() {
    let fixture = Fixture::new();
    let error = fixture
        .glossary_terms
        .create_glossary_term(USER, Uuid::new_v4(), &term("Term::Orphan", "Orphan"), None, None)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}

#[tokio::test]
async fn test_unknown_subtype_is_rejected() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;

    let error = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Bad", "Bad"), Some("DatabaseTable"), None)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}

#[tokio::test]
async fn test_merge_keeps_unset_properties_and_replace_clears_them() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;
    let properties = GlossaryTermProperties {
        summary: Some("original summary".to_string()),
        ..term("Term::Order", "Order")
    };
    let guid = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &properties, None, None)
        .await
        .unwrap();

    let change = GlossaryTermProperties {
        description: Some("A request to buy".to_string()),
        ..Default::default()
    };
    fixture
        .glossary_terms
        .update_glossary_term(USER, guid, &change, true)
        .await
        .unwrap();
    let merged = fixture.glossary_terms.get_term_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(merged.properties.summary.as_deref(), Some("original summary"));
    assert_eq!(merged.properties.description.as_deref(), Some("A request to buy"));
    assert_eq!(merged.properties.qualified_name.as_deref(), Some("Term::Order"));

    let replacement = GlossaryTermProperties {
        description: Some("Replaced".to_string()),
        ..term("Term::Order", "Order")
    };
    fixture
        .glossary_terms
        .update_glossary_term(USER, guid, &replacement, false)
        .await
        .unwrap();
    let replaced = fixture.glossary_terms.get_term_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(replaced.properties.summary, None);
    assert_eq!(replaced.properties.description.as_deref(), Some("Replaced"));
    assert!(replaced.header.version > merged.header.version);
}

#[tokio::test]
async fn test_status_update() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;
    let guid = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Invoice", "Invoice"), None, Some(InstanceStatus::Draft))
        .await
        .unwrap();

    fixture
        .glossary_terms
        .update_glossary_term_status(USER, guid, InstanceStatus::Active)
        .await
        .unwrap();
    let element = fixture.glossary_terms.get_term_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.header.status, InstanceStatus::Active);

    let error = fixture
        .glossary_terms
        .update_glossary_term_status(USER, guid, InstanceStatus::Deleted)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}

#[tokio::test]
async fn test_move_leaves_single_anchor() {
    let fixture = Fixture::new();
    let first = fixture.create_glossary("Glossary::First").await;
    let second = fixture.create_glossary("Glossary::Second").await;
    let guid = fixture
        .glossary_terms
        .create_glossary_term(USER, first, &term("Term::Payment", "Payment"), None, None)
        .await
        .unwrap();

    fixture.glossary_terms.move_glossary_term(USER, guid, second).await.unwrap();

    let anchors = fixture
        .generic
        .repository()
        .get_relationships(guid, Some("TermAnchor"))
        .await
        .unwrap();
    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].other_end(guid), Some(second));

    let element = fixture.glossary_terms.get_term_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.glossary_guid, Some(second));
    assert_eq!(element.header.anchor.map(|a| a.anchor_guid), Some(second));

    let in_first = fixture
        .glossary_terms
        .get_terms_for_glossary(USER, first, SearchOptions::default())
        .await
        .unwrap();
    assert!(in_first.is_empty());
}

#[tokio::test]
async fn test_move_refuses_clashing_qualified_name() {
    let fixture = Fixture::new();
    let first = fixture.create_glossary("Glossary::Sales").await;
    let second = fixture.create_glossary("Glossary::Marketing").await;
    fixture
        .glossary_terms
        .create_glossary_term(USER, first, &term("Term::Lead", "Lead"), None, None)
        .await
        .unwrap();
    let other = fixture
        .glossary_terms
        .create_glossary_term(USER, second, &term("Term::Lead", "Lead"), None, None)
        .await
        .unwrap();

    let error = fixture
        .glossary_terms
        .move_glossary_term(USER, other, first)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());

    let element = fixture.glossary_terms.get_term_by_guid(USER, other, None).await.unwrap();
    assert_eq!(element.glossary_guid, Some(second));
    let in_first = fixture
        .glossary_terms
        .get_terms_for_glossary(USER, first, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(in_first.len(), 1);
}

#[tokio::test]
async fn test_move_carries_facets_to_the_new_glossary() {
    let fixture = Fixture::new();
    let first = fixture.create_glossary("Glossary::Old").await;
    let second = fixture.create_glossary("Glossary::New").await;
    let guid = fixture
        .glossary_terms
        .create_glossary_term(USER, first, &term("Term::Invoice", "Invoice"), None, None)
        .await
        .unwrap();
    let facet = fixture
        .facets
        .add_property_facet(USER, guid, None, &PropertyFacetBuilder::new("Term::Invoice::facet"))
        .await
        .unwrap();

    fixture.glossary_terms.move_glossary_term(USER, guid, second).await.unwrap();

    let anchor = fixture
        .generic
        .repository()
        .get_entity(facet)
        .await
        .unwrap()
        .and_then(|entity| entity.anchor().map(|a| a.anchor_guid));
    assert_eq!(anchor, Some(second));

    fixture
        .generic
        .delete_bean(USER, first, "glossaryGUID", EntityTypeName::Glossary, true, "test")
        .await
        .unwrap();
    let facets = fixture.facets.get_property_facets(USER, guid, 0, 0).await.unwrap();
    assert_eq!(facets.len(), 1);
}

#[tokio::test]
async fn test_merge_keeps_unsupplied_effectivity_end() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Dated").await;
    let now = Utc::now();
    let from = now - Duration::days(10);
    let guid = fixture
        .glossary_terms
        .create_glossary_term(
            USER,
            glossary,
            &GlossaryTermProperties {
                effective_from: Some(from),
                effective_to: Some(now + Duration::days(10)),
                ..term("Term::Season", "Season")
            },
            None,
            None,
        )
        .await
        .unwrap();

    let extend = GlossaryTermProperties {
        effective_to: Some(now + Duration::days(20)),
        ..Default::default()
    };
    fixture.glossary_terms.update_glossary_term(USER, guid, &extend, true).await.unwrap();

    let element = fixture.glossary_terms.get_term_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.properties.effective_from, Some(from));
    assert_eq!(element.properties.effective_to, Some(now + Duration::days(20)));

    let inverted = GlossaryTermProperties {
        effective_to: Some(now - Duration::days(20)),
        ..Default::default()
    };
    let error = fixture
        .glossary_terms
        .update_glossary_term(USER, guid, &inverted, true)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}

#[tokio::test]
async fn test_name_lookup_matches_any_name_property() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;
    let customer = GlossaryTermProperties {
        aliases: vec!["Client".to_string()],
        ..term("Term::Customer", "Customer")
    };
    fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &customer, None, None)
        .await
        .unwrap();
    fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Client Account", "Client Account"), None, None)
        .await
        .unwrap();

    for name in ["Term::Customer", "Customer", "Client"] {
        let found = fixture
            .glossary_terms
            .get_terms_by_name(USER, name, SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1, "lookup by {name}");
        assert_eq!(found[0].properties.qualified_name.as_deref(), Some("Term::Customer"));
    }

    let found = fixture
        .glossary_terms
        .find_terms(USER, "Account$", SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].properties.qualified_name.as_deref(), Some("Term::Client Account"));

    let found = fixture
        .glossary_terms
        .find_terms(USER, "^Term::C", SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn test_invalid_search_inputs() {
    let fixture = Fixture::new();

    let error = fixture
        .glossary_terms
        .find_terms(USER, "(unclosed", SearchOptions::default())
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());

    let error = fixture
        .glossary_terms
        .get_terms_by_name(USER, "", SearchOptions::default())
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}

#[tokio::test]
async fn test_paging_bounds() {
    let fixture = Fixture::new();

    let error = fixture
        .glossary_terms
        .find_terms(USER, ".*", SearchOptions::paged(0, 501))
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());

    let error = fixture
        .glossary_terms
        .find_terms(USER, ".*", SearchOptions::paged(-1, 10))
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());

    let glossary = fixture.create_glossary("Glossary::Paged").await;
    for i in 0..5 {
        let name = format!("Term::Paged{i}");
        fixture
            .glossary_terms
            .create_glossary_term(USER, glossary, &term(&name, &name), None, None)
            .await
            .unwrap();
    }
    let page = fixture
        .glossary_terms
        .get_terms_for_glossary(USER, glossary, SearchOptions::paged(3, 10))
        .await
        .unwrap();
    assert_eq!(page.len(), 2);

    let page = fixture
        .glossary_terms
        .get_terms_for_glossary(USER, glossary, SearchOptions::paged(0, 2))
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
}

#[tokio::test]
async fn test_classifications_are_idempotent() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;
    let guid = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Shipping", "Shipping"), None, None)
        .await
        .unwrap();

    fixture.glossary_terms.set_term_as_spine_object(USER, guid).await.unwrap();
    fixture.glossary_terms.set_term_as_spine_object(USER, guid).await.unwrap();
    fixture
        .glossary_terms
        .set_term_as_activity(USER, guid, Some(ActivityType::Process))
        .await
        .unwrap();

    let entity = fixture.generic.repository().get_entity(guid).await.unwrap().unwrap();
    let spine_objects = entity
        .classifications
        .iter()
        .filter(|c| c.name == "SpineObject")
        .count();
    assert_eq!(spine_objects, 1);
    assert!(entity.is_classified("ActivityDescription"));

    fixture.glossary_terms.clear_term_as_spine_object(USER, guid).await.unwrap();
    fixture.glossary_terms.clear_term_as_spine_object(USER, guid).await.unwrap();
    fixture.glossary_terms.clear_term_as_data_value(USER, guid).await.unwrap();

    let element = fixture.glossary_terms.get_term_by_guid(USER, guid, None).await.unwrap();
    assert!(!element.header.classifications.iter().any(|c| c == "SpineObject"));
    assert!(element.header.classifications.iter().any(|c| c == "ActivityDescription"));
}

#[tokio::test]
async fn test_template_copy_requires_qualified_name() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;
    let template = GlossaryTermProperties {
        summary: Some("Template summary".to_string()),
        ..term("Term::Template", "Template")
    };
    let template_guid = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &template, None, None)
        .await
        .unwrap();
    fixture.glossary_terms.set_term_as_data_value(USER, template_guid).await.unwrap();

    let error = fixture
        .glossary_terms
        .create_glossary_term_from_template(USER, glossary, template_guid, &TemplateProperties::default(), false)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());

    let overlay = TemplateProperties {
        qualified_name: Some("Term::FromTemplate".to_string()),
        display_name: Some("From template".to_string()),
        ..Default::default()
    };
    let copy = fixture
        .glossary_terms
        .create_glossary_term_from_template(USER, glossary, template_guid, &overlay, false)
        .await
        .unwrap();
    assert_ne!(copy, template_guid);

    let element = fixture.glossary_terms.get_term_by_guid(USER, copy, None).await.unwrap();
    assert_eq!(element.properties.qualified_name.as_deref(), Some("Term::FromTemplate"));
    assert_eq!(element.properties.display_name.as_deref(), Some("From template"));
    assert_eq!(element.properties.summary.as_deref(), Some("Template summary"));
    assert!(element.header.classifications.iter().any(|c| c == "DataValue"));
    assert_eq!(element.glossary_guid, Some(glossary));
}

#[tokio::test]
async fn test_update_from_template_keeps_qualified_name() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;
    let template = GlossaryTermProperties {
        description: Some("Template description".to_string()),
        ..term("Term::Template", "Template")
    };
    let template_guid = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &template, None, None)
        .await
        .unwrap();
    let guid = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Target", "Target"), None, None)
        .await
        .unwrap();

    fixture
        .glossary_terms
        .update_glossary_term_from_template(USER, guid, template_guid, true)
        .await
        .unwrap();

    let element = fixture.glossary_terms.get_term_by_guid(USER, guid, None).await.unwrap();
    assert_eq!(element.properties.qualified_name.as_deref(), Some("Term::Target"));
    assert_eq!(element.properties.description.as_deref(), Some("Template description"));
}

#[tokio::test]
async fn test_deep_copy_recreates_relationships() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;
    let category = fixture.create_category("Category::Parties").await;
    let template = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Template", "Template"), None, None)
        .await
        .unwrap();
    let related = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Related", "Related"), None, None)
        .await
        .unwrap();
    fixture
        .glossary_terms
        .setup_term_category(USER, category, template, None, None)
        .await
        .unwrap();
    fixture
        .glossary_terms
        .setup_term_relationship(
            USER,
            template,
            related,
            RelationshipTypeName::Synonym,
            &TermRelationshipProperties::default(),
        )
        .await
        .unwrap();

    let overlay = TemplateProperties {
        qualified_name: Some("Term::Deep".to_string()),
        ..Default::default()
    };
    let copy = fixture
        .glossary_terms
        .create_glossary_term_from_template(USER, glossary, template, &overlay, true)
        .await
        .unwrap();

    let in_category = fixture
        .glossary_terms
        .get_terms_for_glossary_category(USER, category, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(in_category.len(), 2);

    let synonyms = fixture
        .glossary_terms
        .get_related_terms(USER, copy, Some(RelationshipTypeName::Synonym), SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(synonyms.len(), 1);
    assert_eq!(synonyms[0].related_term.header.guid, related);
}

#[tokio::test]
async fn test_term_relationship_lifecycle() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;
    let customer = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Customer", "Customer"), None, None)
        .await
        .unwrap();
    let client = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Client", "Client"), None, None)
        .await
        .unwrap();

    let properties = TermRelationshipProperties {
        description: Some("Same meaning".to_string()),
        status: Some(TermRelationshipStatus::Draft),
        confidence: Some(80),
        ..Default::default()
    };
    let relationship = fixture
        .glossary_terms
        .setup_term_relationship(USER, customer, client, RelationshipTypeName::Synonym, &properties)
        .await
        .unwrap();

    let error = fixture
        .glossary_terms
        .setup_term_relationship(USER, customer, client, RelationshipTypeName::TermAnchor, &properties)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());

    let change = TermRelationshipProperties {
        status: Some(TermRelationshipStatus::Active),
        ..Default::default()
    };
    fixture
        .glossary_terms
        .update_term_relationship(USER, customer, client, RelationshipTypeName::Synonym, &change, true)
        .await
        .unwrap();

    let related = fixture
        .glossary_terms
        .get_related_terms(USER, client, None, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].relationship_guid, relationship);
    assert_eq!(related[0].relationship_type, "Synonym");
    assert_eq!(related[0].related_term.header.guid, customer);
    assert_eq!(related[0].relationship_properties.status, Some(TermRelationshipStatus::Active));
    assert_eq!(related[0].relationship_properties.confidence, Some(80));

    fixture
        .glossary_terms
        .clear_term_relationship(USER, customer, client, RelationshipTypeName::Synonym)
        .await
        .unwrap();
    let related = fixture
        .glossary_terms
        .get_related_terms(USER, customer, None, SearchOptions::default())
        .await
        .unwrap();
    assert!(related.is_empty());

    let error = fixture
        .glossary_terms
        .update_term_relationship(USER, customer, client, RelationshipTypeName::Synonym, &change, true)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}

#[tokio::test]
async fn test_category_membership() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;
    let category = fixture.create_category("Category::Sales").await;
    let guid = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Discount", "Discount"), None, None)
        .await
        .unwrap();

    fixture
        .glossary_terms
        .setup_term_category(USER, category, guid, Some("primary"), Some(TermRelationshipStatus::Active))
        .await
        .unwrap();
    let terms = fixture
        .glossary_terms
        .get_terms_for_glossary_category(USER, category, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(terms.len(), 1);

    fixture.glossary_terms.clear_term_category(USER, category, guid).await.unwrap();
    let terms = fixture
        .glossary_terms
        .get_terms_for_glossary_category(USER, category, SearchOptions::default())
        .await
        .unwrap();
    assert!(terms.is_empty());
}

#[tokio::test]
async fn test_archive_and_remove() {
    let fixture = Fixture::new();
    let glossary = fixture.create_glossary("Glossary::Retail").await;
    let archived = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Legacy", "Legacy"), None, None)
        .await
        .unwrap();
    let removed = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Obsolete", "Obsolete"), None, None)
        .await
        .unwrap();

    let archive = ArchiveProperties {
        archive_process: Some("retention".to_string()),
        ..Default::default()
    };
    fixture
        .glossary_terms
        .archive_glossary_term(USER, archived, &archive)
        .await
        .unwrap();
    let entity = fixture.generic.repository().get_entity(archived).await.unwrap().unwrap();
    assert!(entity.is_classified("Memento"));

    fixture.glossary_terms.remove_glossary_term(USER, removed).await.unwrap();
    let error = fixture
        .glossary_terms
        .get_term_by_guid(USER, removed, None)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}

#[tokio::test]
async fn test_denied_user_cannot_create() {
    let fixture = Fixture::with_env(&[("DENIED_USERS", "mallory")]);
    let glossary = fixture.create_glossary("Glossary::Retail").await;

    let error = fixture
        .glossary_terms
        .create_glossary_term("mallory", glossary, &term("Term::Secret", "Secret"), None, None)
        .await
        .unwrap_err();
    assert!(error.is_not_authorized());
}

#[tokio::test]
async fn test_deprecated_subtype_is_refused() {
    let fixture = Fixture::with_env(&[("DEPRECATED_TYPES", "ControlledGlossaryTerm")]);
    let glossary = fixture.create_glossary("Glossary::Controlled").await;

    let error = fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Controlled", "Controlled"), Some("ControlledGlossaryTerm"), None)
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());

    fixture
        .glossary_terms
        .create_glossary_term(USER, glossary, &term("Term::Plain", "Plain"), None, None)
        .await
        .unwrap();
}
