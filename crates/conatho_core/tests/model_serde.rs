use conatho_core::{Attribute, AttributeValue, Connection, Datatype, Entity};
use uuid::Uuid;

#[test]
fn entity_serializes_with_adjacency() {
    let mut entity = Entity::new(4, 5, "Acme");
    let connection = Connection::new(entity.id, Uuid::new_v4(), "Employs");
    entity.attach_connection(connection.id);

    let json = serde_json::to_value(&entity).unwrap();
    assert_eq!(json["x"], 4);
    assert_eq!(json["has_image"], false);
    assert_eq!(json["connections"][0], connection.id.to_string());

    let back: Entity = serde_json::from_value(json).unwrap();
    assert_eq!(back, entity);
}

#[test]
fn attribute_value_is_tagged_by_kind() {
    let attribute = Attribute {
        id: 1,
        entity: Uuid::new_v4(),
        type_id: 2,
        name: "Motto".to_string(),
        datatype: Datatype::String,
        value: Some(AttributeValue::Text("hi".to_string())),
    };

    let json = serde_json::to_value(&attribute).unwrap();
    assert_eq!(json["datatype"], "string");
    assert_eq!(json["value"]["kind"], "text");
    assert_eq!(json["value"]["value"], "hi");
}
