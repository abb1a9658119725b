use conatho_core::{Document, DocumentError, EntityId};
use rusqlite::Connection;
use std::path::Path;

fn count_rows(path: &Path, sql: &str) -> i64 {
    let conn = Connection::open(path).unwrap();
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

fn assert_symmetric(document: &Document) {
    for connection in document.connections() {
        let superior = document.entity(connection.superior).unwrap();
        let inferior = document.entity(connection.inferior).unwrap();
        assert_eq!(
            superior.connections.iter().filter(|id| **id == connection.id).count(),
            1
        );
        assert_eq!(
            inferior.connections.iter().filter(|id| **id == connection.id).count(),
            1
        );
    }
}

#[test]
fn employs_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("company.conatho");
    let mut document = Document::open(&path).unwrap();

    let a = document.create_entity(0, 0, "A").unwrap();
    let b = document.create_entity(0, 0, "B").unwrap();
    let c = document.connect(a, b, "Employs").unwrap();

    let connection = document.connection(c).unwrap();
    assert_eq!(connection.superior, a);
    assert_eq!(connection.inferior, b);
    assert_eq!(connection.name, "Employs");
    assert_eq!(document.entity(a).unwrap().connections, vec![c]);
    assert_eq!(document.entity(b).unwrap().connections, vec![c]);

    document.delete_entity(a).unwrap();

    assert!(document.entity(a).is_none());
    assert!(document.connection(c).is_none());
    assert!(document.entity(b).unwrap().connections.is_empty());
    assert_eq!(count_rows(&path, "SELECT COUNT(*) FROM connections;"), 0);
    assert_eq!(count_rows(&path, "SELECT COUNT(*) FROM entities;"), 1);
}

#[test]
fn self_connection_is_rejected_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("self.conatho");
    let mut document = Document::open(&path).unwrap();
    let a = document.create_entity(0, 0, "A").unwrap();

    let err = document.connect(a, a, "").unwrap_err();
    assert!(matches!(err, DocumentError::SelfConnection(id) if id == a));
    assert_eq!(document.connection_count(), 0);
    assert!(document.entity(a).unwrap().connections.is_empty());
    assert_eq!(count_rows(&path, "SELECT COUNT(*) FROM connections;"), 0);
}

#[test]
fn failed_store_writes_leave_memory_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.conatho");
    let mut document = Document::open(&path).unwrap();
    let a = document.create_entity(0, 0, "A").unwrap();
    let b = document.create_entity(0, 0, "B").unwrap();
    let edge = document.connect(a, b, "").unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("DROP TABLE connections;").unwrap();

    let err = document.connect(b, a, "Reports").unwrap_err();
    assert!(matches!(err, DocumentError::Repo(_)));
    assert_eq!(document.connection_count(), 1);
    assert_eq!(document.entity(a).unwrap().connections, vec![edge]);
    assert_eq!(document.entity(b).unwrap().connections, vec![edge]);

    conn.execute_batch("DROP TABLE entities;").unwrap();

    let err = document.create_entity(1, 1, "C").unwrap_err();
    assert!(matches!(err, DocumentError::Repo(_)));
    assert_eq!(document.entity_count(), 2);
    assert_eq!(document.entity_ids(), &[a, b]);
    assert_symmetric(&document);
}

#[test]
fn reload_rebuilds_adjacency_from_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reload.conatho");

    let (hub, spokes, edges) = {
        let mut document = Document::open(&path).unwrap();
        let hub = document.create_entity(0, 0, "hub").unwrap();
        let spokes = (1..=3)
            .map(|i| document.create_entity(i * 10, -i, format!("spoke {i}")).unwrap())
            .collect::<Vec<EntityId>>();
        let edges = spokes
            .iter()
            .map(|spoke| document.connect(hub, *spoke, "owns").unwrap())
            .collect::<Vec<_>>();
        document.close().unwrap();
        (hub, spokes, edges)
    };

    let document = Document::load(&path).unwrap();
    assert_eq!(document.entity_count(), 4);
    assert_eq!(document.connection_count(), 3);
    assert_eq!(document.entity_ids().len(), 4);
    assert_eq!(document.connection_ids().len(), 3);

    let mut hub_edges = document.entity(hub).unwrap().connections.clone();
    hub_edges.sort();
    let mut expected = edges.clone();
    expected.sort();
    assert_eq!(hub_edges, expected);
    for (spoke, edge) in spokes.iter().zip(&edges) {
        assert_eq!(document.entity(*spoke).unwrap().connections, vec![*edge]);
        assert_eq!(document.connections_of(*spoke)[0].superior, hub);
    }
    assert_eq!(document.entity(spokes[2]).unwrap().y, -3);
    assert_symmetric(&document);
}

#[test]
fn load_skips_adjacency_for_missing_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dangling.conatho");

    let (kept, orphan_edge) = {
        let mut document = Document::open(&path).unwrap();
        let kept = document.create_entity(0, 0, "kept").unwrap();
        let gone = document.create_entity(0, 0, "gone").unwrap();
        let edge = document.connect(kept, gone, "").unwrap();
        document.close().unwrap();

        // Remove the entity row behind the document's back.
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "DELETE FROM entities WHERE id = ?1;",
            [gone.as_bytes().as_slice()],
        )
        .unwrap();
        (kept, edge)
    };

    let mut document = Document::load(&path).unwrap();
    assert_eq!(document.entity_count(), 1);
    assert!(document.connection(orphan_edge).is_some());
    assert_eq!(document.entity(kept).unwrap().connections, vec![orphan_edge]);

    // Removing it must not trip over the absent endpoint.
    document.remove_connection(orphan_edge).unwrap();
    assert!(document.entity(kept).unwrap().connections.is_empty());
    assert_eq!(document.connection_count(), 0);
}

#[test]
fn deleting_entity_with_dangling_peer_removes_the_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.conatho");

    let (target, edge) = {
        let mut document = Document::open(&path).unwrap();
        let target = document.create_entity(0, 0, "target").unwrap();
        let gone = document.create_entity(0, 0, "gone").unwrap();
        let edge = document.connect(gone, target, "").unwrap();
        document.close().unwrap();

        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "DELETE FROM entities WHERE id = ?1;",
            [gone.as_bytes().as_slice()],
        )
        .unwrap();
        (target, edge)
    };

    let mut document = Document::load(&path).unwrap();
    document.delete_entity(target).unwrap();
    assert!(document.connection(edge).is_none());
    assert_eq!(document.entity_count(), 0);
    assert_eq!(count_rows(&path, "SELECT COUNT(*) FROM connections;"), 0);
}

#[test]
fn isolated_entity_delete_only_touches_its_row() {
    let mut document = Document::open_in_memory().unwrap();
    let a = document.create_entity(0, 0, "A").unwrap();
    let b = document.create_entity(5, 5, "B").unwrap();
    let c = document.create_entity(9, 9, "C").unwrap();
    let edge = document.connect(b, c, "").unwrap();

    document.delete_entity(a).unwrap();
    assert_eq!(document.entity_ids(), &[b, c]);
    assert_eq!(document.entity(b).unwrap().connections, vec![edge]);

    let err = document.delete_entity(a).unwrap_err();
    assert!(matches!(err, DocumentError::EntityNotFound(id) if id == a));
}

#[test]
fn rename_writes_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rename.conatho");
    let mut document = Document::open(&path).unwrap();
    let a = document.create_entity(0, 0, "draft").unwrap();

    document.rename_entity(a, "final").unwrap();
    assert_eq!(document.entity(a).unwrap().name, "final");

    document.load_all().unwrap();
    assert_eq!(document.entity(a).unwrap().name, "final");
}
