mod common;

use common::{Fixture, USER};
use metadata_service::builders::PropertyFacetBuilder;
use metadata_service::domain::{
    GlossaryTermProperties, Guid, ReferenceValueAssignmentProperties, ValidValueProperties,
};
use metadata_service::handlers::{SearchOptions, VENDOR_PROPERTIES_SOURCE};

async fn term(fixture: &Fixture) -> Guid {
    let glossary = fixture.create_glossary("Glossary::Codes").await;
    fixture
        .glossary_terms
        .create_glossary_term(
            USER,
            glossary,
            &GlossaryTermProperties {
                qualified_name: Some("Term::Country".to_string()),
                ..Default::default()
            },
            None,
            None,
        )
        .await
        .unwrap()
}

async fn valid_value(fixture: &Fixture, qualified_name: &str, preferred_value: &str) -> Guid {
    fixture
        .reference_values
        .create_valid_value(
            USER,
            &ValidValueProperties {
                qualified_name: Some(qualified_name.to_string()),
                preferred_value: Some(preferred_value.to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_assignment_is_read_back_with_its_properties() {
    let fixture = Fixture::new();
    let element = term(&fixture).await;
    let value = valid_value(&fixture, "ValidValue::Country.NZ", "NZ").await;

    let properties = ReferenceValueAssignmentProperties {
        attribute_name: Some("countryCode".to_string()),
        confidence: Some(90),
        steward: Some("erinoverview".to_string()),
        ..Default::default()
    };
    let relationship = fixture
        .reference_values
        .assign_reference_value(USER, element, value, &properties)
        .await
        .unwrap();

    let assignments = fixture
        .reference_values
        .get_reference_values(USER, element, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].relationship_guid, Some(relationship));
    assert_eq!(assignments[0].element.header.guid, value);
    assert_eq!(assignments[0].element.properties.preferred_value.as_deref(), Some("NZ"));
    assert_eq!(assignments[0].properties, properties);
}

#[tokio::test]
async fn test_reassignment_replaces_properties() {
    let fixture = Fixture::new();
    let element = term(&fixture).await;
    let value = valid_value(&fixture, "ValidValue::Country.FR", "FR").await;

    let first = fixture
        .reference_values
        .assign_reference_value(
            USER,
            element,
            value,
            &ReferenceValueAssignmentProperties {
                attribute_name: Some("countryCode".to_string()),
                notes: Some("first pass".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let second = fixture
        .reference_values
        .assign_reference_value(
            USER,
            element,
            value,
            &ReferenceValueAssignmentProperties {
                confidence: Some(50),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(first, second);

    let assignments = fixture
        .reference_values
        .get_reference_values(USER, element, SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].properties.attribute_name, None);
    assert_eq!(assignments[0].properties.confidence, Some(50));
}

#[tokio::test]
async fn test_valid_value_side_does_not_list_assignments() {
    let fixture = Fixture::new();
    let element = term(&fixture).await;
    let value = valid_value(&fixture, "ValidValue::Country.DE", "DE").await;
    fixture
        .reference_values
        .assign_reference_value(USER, element, value, &ReferenceValueAssignmentProperties::default())
        .await
        .unwrap();

    let from_value = fixture
        .reference_values
        .get_reference_values(USER, value, SearchOptions::default())
        .await
        .unwrap();
    assert!(from_value.is_empty());
}

#[tokio::test]
async fn test_unassign() {
    let fixture = Fixture::new();
    let element = term(&fixture).await;
    let value = valid_value(&fixture, "ValidValue::Country.IT", "IT").await;
    fixture
        .reference_values
        .assign_reference_value(USER, element, value, &ReferenceValueAssignmentProperties::default())
        .await
        .unwrap();

    fixture.reference_values.unassign_reference_value(USER, element, value).await.unwrap();
    let assignments = fixture
        .reference_values
        .get_reference_values(USER, element, SearchOptions::default())
        .await
        .unwrap();
    assert!(assignments.is_empty());

    let read = fixture.reference_values.get_valid_value_by_guid(USER, value, None).await.unwrap();
    assert_eq!(read.properties.qualified_name.as_deref(), Some("ValidValue::Country.IT"));
}

#[tokio::test]
async fn test_property_facets_attach_to_any_referenceable() {
    let fixture = Fixture::new();
    let element = term(&fixture).await;

    let builder = PropertyFacetBuilder::new("Term::Country::facet")
        .with_schema_version("2")
        .with_property("format", "ISO-3166");
    let facet = fixture
        .facets
        .add_property_facet(USER, element, Some("iso"), &builder)
        .await
        .unwrap();

    let facets = fixture.facets.get_property_facets(USER, element, 0, 0).await.unwrap();
    assert_eq!(facets.len(), 1);
    assert_eq!(facets[0].header.guid, facet);
    assert_eq!(facets[0].source.as_deref(), Some("iso"));
    assert_eq!(facets[0].properties.schema_version.as_deref(), Some("2"));
    assert_eq!(facets[0].properties.properties.get("format").map(String::as_str), Some("ISO-3166"));

    let change = PropertyFacetBuilder::default().with_description("country codes");
    fixture.facets.update_property_facet(USER, facet, &change, true).await.unwrap();
    let facets = fixture.facets.get_property_facets(USER, element, 0, 0).await.unwrap();
    assert_eq!(facets[0].properties.description.as_deref(), Some("country codes"));
    assert_eq!(facets[0].properties.schema_version.as_deref(), Some("2"));

    fixture.facets.remove_property_facet(USER, facet).await.unwrap();
    let facets = fixture.facets.get_property_facets(USER, element, 0, 0).await.unwrap();
    assert!(facets.is_empty());
}

#[tokio::test]
async fn test_vendor_properties_live_in_a_sourced_facet() {
    let fixture = Fixture::new();
    let element = term(&fixture).await;
    let vendor = [("owner".to_string(), "dba".to_string())].into_iter().collect();

    fixture
        .facets
        .set_vendor_properties(USER, element, "Term::Country", &vendor, "test")
        .await
        .unwrap();
    let facets = fixture.facets.get_property_facets(USER, element, 0, 0).await.unwrap();
    assert_eq!(facets.len(), 1);
    assert_eq!(facets[0].source.as_deref(), Some(VENDOR_PROPERTIES_SOURCE));
    assert_eq!(
        fixture.facets.get_vendor_properties(USER, element, "test").await.unwrap(),
        vendor
    );

    fixture
        .facets
        .set_vendor_properties(USER, element, "Term::Country", &Default::default(), "test")
        .await
        .unwrap();
    assert!(fixture.facets.get_property_facets(USER, element, 0, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_facet_on_unknown_element_fails() {
    let fixture = Fixture::new();
    let error = fixture
        .facets
        .add_property_facet(USER, uuid::Uuid::new_v4(), None, &PropertyFacetBuilder::new("Facet::orphan"))
        .await
        .unwrap_err();
    assert!(error.is_invalid_parameter());
}
