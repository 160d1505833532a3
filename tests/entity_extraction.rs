use pretty_assertions::assert_eq;
use schemascope::orm::{
    CascadeType, EnumEncoding, FetchType, InheritanceInfo, InheritanceStrategy, PrimaryKeyInfo,
    PropertyKind, RelationKind,
};
use schemascope::{EntityExtractor, Error, MetadataRegistry, ObjectKind, SchemaContext};

const SHOP: &str = include_str!("fixtures/shop.json");

fn registry() -> MetadataRegistry {
    MetadataRegistry::from_json(SHOP).expect("fixture manifest loads")
}

#[test]
fn properties_are_sorted_by_name() {
    let registry = registry();
    let customer = EntityExtractor::new(&registry)
        .entity_definition("Customer")
        .unwrap();

    let names: Vec<_> = customer.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["createdBy", "id", "name", "orders", "region", "status", "version"]
    );
}

#[test]
fn header_comes_from_class_markers_and_metamodel() {
    let registry = registry();
    let customer = EntityExtractor::new(&registry)
        .entity_definition("Customer")
        .unwrap();

    assert_eq!(customer.name, "Customer");
    assert_eq!(customer.simple_name, "Customer");
    assert_eq!(customer.type_name, "com.acme.shop.Customer");
    assert_eq!(customer.table_name, "SHOP_CUSTOMER");
    assert_eq!(customer.schema_name.as_deref(), Some("sales"));
    assert!(customer.persistent);
    assert!(!customer.embeddable);
    assert!(customer.soft_delete);
    assert_eq!(customer.markers, vec!["@Entity", "@Table"]);
    assert_eq!(customer.inheritance, None);
}

#[test]
fn version_and_key_fields_are_found_on_ancestors() {
    let registry = registry();
    let customer = EntityExtractor::new(&registry)
        .entity_definition("Customer")
        .unwrap();

    assert!(customer.versioned);
    assert_eq!(
        customer.primary_key,
        Some(PrimaryKeyInfo {
            property_name: "id".into(),
            type_name: "UUID".into(),
            column_name: "ID".into(),
            generated: true,
        })
    );

    let created_by = customer.property("createdBy").unwrap();
    assert_eq!(created_by.column_name.as_deref(), Some("CREATED_BY"));
    assert_eq!(created_by.markers, vec!["@CreatedBy"]);
}

#[test]
fn many_to_one_defaults_join_column_to_property_id() {
    let registry = registry();
    let customer = EntityExtractor::new(&registry)
        .entity_definition("Customer")
        .unwrap();

    let region = customer.property("region").unwrap();
    assert_eq!(region.kind, PropertyKind::Association);
    assert_eq!(region.relation, Some(RelationKind::ManyToOne));
    assert_eq!(region.related_entity.as_deref(), Some("Region"));
    assert_eq!(region.column_name.as_deref(), Some("region_id"));
    assert_eq!(region.fetch, Some(FetchType::Lazy));
    assert_eq!(region.cascade, Some(Vec::new()));
    assert_eq!(region.mapped_by, None);
}

#[test]
fn explicit_join_column_wins() {
    let registry = registry();
    let order = EntityExtractor::new(&registry)
        .entity_definition("Order")
        .unwrap();

    let customer = order.property("customer").unwrap();
    assert_eq!(customer.column_name.as_deref(), Some("CUSTOMER_ID"));
    assert_eq!(customer.fetch, Some(FetchType::Eager));
    assert!(customer.mandatory);

    let amount = order.property("amount").unwrap();
    assert_eq!(amount.type_name, "BigDecimal");
    assert_eq!(amount.precision, Some(19));
    assert_eq!(amount.scale, Some(2));
    assert_eq!(amount.length, Some(255));
}

#[test]
fn inverse_side_carries_mapped_by_and_lazy_fetch() {
    let registry = registry();
    let customer = EntityExtractor::new(&registry)
        .entity_definition("Customer")
        .unwrap();

    let orders = customer.property("orders").unwrap();
    assert_eq!(orders.relation, Some(RelationKind::OneToMany));
    assert_eq!(orders.mapped_by.as_deref(), Some("customer"));
    assert_eq!(orders.fetch, Some(FetchType::Lazy));
    assert_eq!(orders.cascade, Some(vec![CascadeType::All]));
    assert_eq!(orders.column_name, None);
}

#[test]
fn enumerated_fields_record_enum_type_and_encoding() {
    let registry = registry();
    let customer = EntityExtractor::new(&registry)
        .entity_definition("Customer")
        .unwrap();

    let status = customer.property("status").unwrap();
    assert_eq!(status.kind, PropertyKind::Enum);
    assert_eq!(status.enum_type.as_deref(), Some("com.acme.shop.CustomerStatus"));
    assert_eq!(status.enum_encoding, Some(EnumEncoding::String));
    assert!(status.markers.is_empty());

    let name = customer.property("name").unwrap();
    assert_eq!(name.enum_type, None);
    assert_eq!(name.length, Some(100));
    assert_eq!(name.markers, vec!["@InstanceName"]);
}

#[test]
fn inheritance_markers_are_read_from_the_declaring_type() {
    let registry = registry();
    let extractor = EntityExtractor::new(&registry);

    let payment = extractor.entity_definition("Payment").unwrap();
    assert_eq!(
        payment.inheritance,
        Some(InheritanceInfo {
            strategy: Some(InheritanceStrategy::Joined),
            discriminator_column: Some("KIND".into()),
            discriminator_value: None,
        })
    );

    let card = extractor.entity_definition("CardPayment").unwrap();
    assert_eq!(
        card.inheritance,
        Some(InheritanceInfo {
            strategy: None,
            discriminator_column: None,
            discriminator_value: Some("CARD".into()),
        })
    );
    assert_eq!(card.table_name, "CARDPAYMENT");
    assert_eq!(card.primary_key.map(|pk| pk.type_name), Some("Long".to_string()));
}

#[test]
fn embeddables_are_flagged() {
    let registry = registry();
    let address = EntityExtractor::new(&registry)
        .entity_definition("Address")
        .unwrap();

    assert!(address.embeddable);
    assert!(!address.persistent);
    assert!(!address.versioned);
    assert_eq!(address.primary_key, None);
    assert_eq!(address.table_name, "ADDRESS");
}

#[test]
fn unknown_entity_is_not_found() {
    let registry = registry();
    let err = EntityExtractor::new(&registry)
        .entity_definition("Invoice")
        .unwrap_err();

    match err {
        Error::NotFound { kind, name } => {
            assert_eq!(kind, ObjectKind::Entity);
            assert_eq!(name, "Invoice");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn extraction_is_idempotent() {
    let registry = registry();
    let extractor = EntityExtractor::new(&registry);
    assert_eq!(
        extractor.entity_definition("Customer").unwrap(),
        extractor.entity_definition("Customer").unwrap()
    );
}

#[test]
fn entity_report_text() {
    let registry = registry();
    let report = EntityExtractor::new(&registry).entity_report("Order").unwrap();

    assert_eq!(
        report,
        "\
=== Entity Definition ===
Name: Order
Class: com.acme.shop.Order
Table: SHOP_ORDER
Persistent: true
Embeddable: false
Soft Deletable: false
Versioned: true

--- Primary Key ---
Property: id
Type: UUID
Column: ID
Generated: true

--- Properties (3) ---

amount:
  Type: BigDecimal
  Property Type: DATATYPE
  Column: AMOUNT
  Mandatory: false
  Read Only: false

customer:
  Type: Customer
  Property Type: ASSOCIATION
  Column: CUSTOMER_ID
  Mandatory: true
  Read Only: false
  Relation: ManyToOne
  Related Entity: Customer
  Fetch: EAGER

id:
  Type: UUID
  Property Type: DATATYPE
  Column: ID
  Mandatory: true
  Read Only: false
"
    );
}

#[test]
fn entity_context_dedups_and_fails_as_a_whole() {
    let registry = registry();
    let extractor = EntityExtractor::new(&registry);

    let context = SchemaContext::for_entities(&extractor, ["Region", "Order", "Region"]).unwrap();
    let names: Vec<_> = context.sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Region", "Order"]);
    assert!(context
        .to_prompt_text()
        .starts_with("=== Region ===\n=== Entity Definition ===\nName: Region\n"));

    let err = SchemaContext::for_entities(&extractor, ["Region", "Invoice"]).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn property_less_entity_report_omits_properties_section() {
    let registry = MetadataRegistry::from_json(
        r#"{"types":[{"name":"app.Marker"}],"entities":[{"name":"Marker","type":"app.Marker"}]}"#,
    )
    .unwrap();
    let report = EntityExtractor::new(&registry).entity_report("Marker").unwrap();

    assert!(!report.contains("--- Properties"));
    assert!(report.ends_with(
        "Table: MARKER\nPersistent: true\nEmbeddable: false\nSoft Deletable: false\nVersioned: false\n"
    ));
}
