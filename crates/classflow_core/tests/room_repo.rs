use chrono::{TimeZone, Utc};
use classflow_core::db::open_db_in_memory;
use classflow_core::{
    KeyValueStore, MemoryKeyValueStore, RepoError, Room, RoomId, RoomRepository,
    SqliteKeyValueStore, StorageError, StorageResult, StoredRoomRepository, SubTask,
    UpsertOutcome, ROOMS_STORAGE_KEY,
};

fn sample_room(title: &str) -> Room {
    Room::new(
        title,
        "",
        Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
        vec![SubTask::checkbox("step")],
    )
    .unwrap()
}

#[test]
fn empty_store_lists_no_rooms() {
    let store = MemoryKeyValueStore::new();
    let repo = StoredRoomRepository::new(&store);

    assert!(repo.list_rooms().unwrap().is_empty());
    assert_eq!(repo.get_room(&RoomId::from("nope")).unwrap(), None);
    assert!(store.is_empty());
}

#[test]
fn insert_appends_in_order_and_get_finds_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = StoredRoomRepository::new(SqliteKeyValueStore::new(&conn));

    let first = sample_room("first");
    let second = sample_room("second");
    repo.insert_room(&first).unwrap();
    repo.insert_room(&second).unwrap();

    let titles: Vec<String> = repo
        .list_rooms()
        .unwrap()
        .iter()
        .map(|room| room.title().to_string())
        .collect();
    assert_eq!(titles, vec!["first", "second"]);
    assert_eq!(repo.get_room(second.id()).unwrap(), Some(second));
}

#[test]
fn insert_with_taken_id_is_rejected() {
    let store = MemoryKeyValueStore::new();
    let repo = StoredRoomRepository::new(&store);
    let room = sample_room("dup");

    repo.insert_room(&room).unwrap();
    let err = repo.insert_room(&room).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyExists(id) if &id == room.id()));
    assert_eq!(repo.list_rooms().unwrap().len(), 1);
}

#[test]
fn update_replaces_in_place_and_reports_missing_rooms() {
    let store = MemoryKeyValueStore::new();
    let repo = StoredRoomRepository::new(&store);
    let first = sample_room("first");
    let mut second = sample_room("second");
    let third = sample_room("third");
    for room in [&first, &second, &third] {
        repo.insert_room(room).unwrap();
    }

    second.override_progress(40).unwrap();
    repo.update_room(&second).unwrap();

    let rooms = repo.list_rooms().unwrap();
    assert_eq!(rooms.len(), 3);
    assert_eq!(rooms[1].id(), second.id());
    assert_eq!(rooms[1].progress(), 40);

    let stranger = sample_room("stranger");
    let err = repo.update_room(&stranger).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if &id == stranger.id()));
}

#[test]
fn upsert_replaces_existing_and_appends_new() {
    let store = MemoryKeyValueStore::new();
    let repo = StoredRoomRepository::new(&store);
    let mut room = sample_room("original");
    repo.insert_room(&room).unwrap();
    repo.insert_room(&sample_room("other")).unwrap();

    room.override_progress(90).unwrap();
    assert_eq!(repo.upsert_room(&room).unwrap(), UpsertOutcome::Replaced);
    let rooms = repo.list_rooms().unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0].progress(), 90);

    assert_eq!(
        repo.upsert_room(&sample_room("new")).unwrap(),
        UpsertOutcome::Inserted
    );
    assert_eq!(repo.list_rooms().unwrap().len(), 3);
}

#[test]
fn corrupted_collection_is_reported_not_masked() {
    let store = MemoryKeyValueStore::new();
    store.set_item(ROOMS_STORAGE_KEY, "[{\"id\":").unwrap();
    let repo = StoredRoomRepository::new(&store);

    let err = repo.list_rooms().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    let err = repo.insert_room(&sample_room("blocked")).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    assert_eq!(
        store.get_item(ROOMS_STORAGE_KEY).unwrap().as_deref(),
        Some("[{\"id\":")
    );

    let room = sample_room("twin");
    let twins = serde_json::to_string(&[room.clone(), room.clone()]).unwrap();
    store.set_item(ROOMS_STORAGE_KEY, &twins).unwrap();

    let err = repo.get_room(room.id()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    let err = repo.upsert_room(&room).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    assert_eq!(
        store.get_item(ROOMS_STORAGE_KEY).unwrap().as_deref(),
        Some(twins.as_str())
    );
}

#[test]
fn collection_is_stored_as_one_json_array() {
    let store = MemoryKeyValueStore::new();
    let repo = StoredRoomRepository::new(&store);
    let room = sample_room("json");
    repo.insert_room(&room).unwrap();

    assert_eq!(store.len(), 1);
    let raw = store.get_item(ROOMS_STORAGE_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value.as_array().map(Vec::len), Some(1));
    assert_eq!(value[0]["id"], room.id().as_str());
}

struct ReadOnlyStore {
    inner: MemoryKeyValueStore,
}

impl KeyValueStore for ReadOnlyStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }
}

#[test]
fn write_failures_propagate_without_retry() {
    let repo = StoredRoomRepository::new(ReadOnlyStore {
        inner: MemoryKeyValueStore::new(),
    });

    let err = repo.insert_room(&sample_room("lost")).unwrap_err();
    assert!(matches!(err, RepoError::Storage(StorageError::Unavailable(_))));
    assert!(repo.list_rooms().unwrap().is_empty());
}
