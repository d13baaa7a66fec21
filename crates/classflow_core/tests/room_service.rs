use chrono::{DateTime, Duration, TimeZone, Utc};
use classflow_core::db::open_db_in_memory;
use classflow_core::{
    CreateRoomRequest, ImportError, KeyValueStore, MemoryKeyValueStore, NewSubTask, RoomId,
    RoomService, RoomServiceError, RoomValidationError, SqliteKeyValueStore,
    StoredRoomRepository, SubTaskId, SubTaskMutationError, UpsertOutcome,
    DEFAULT_REQUIRED_CHARACTERS, ROOMS_STORAGE_KEY,
};

fn deadline() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 14, 0, 0, 0).unwrap()
}

fn request(title: &str, sub_tasks: Vec<NewSubTask>) -> CreateRoomRequest {
    CreateRoomRequest {
        title: title.to_string(),
        description: "Build a model volcano".to_string(),
        deadline: Some(deadline()),
        sub_tasks,
    }
}

#[test]
fn create_room_persists_with_zero_progress() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));
    let before = Utc::now();

    let room = service
        .create_room(request(
            "Science Fair",
            vec![
                NewSubTask::checkbox("Pick a topic"),
                NewSubTask::text("Write abstract", DEFAULT_REQUIRED_CHARACTERS),
            ],
        ))
        .unwrap();

    assert_eq!(room.progress(), 0);
    assert_eq!(room.total_count(), 2);
    assert!(room.created_at() >= before && room.created_at() <= Utc::now());
    assert_eq!(service.get_room(room.id()).unwrap(), Some(room.clone()));
    assert_eq!(service.list_rooms().unwrap(), vec![room]);
}

#[test]
fn create_room_with_empty_title_persists_nothing() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));

    let err = service.create_room(request("", Vec::new())).unwrap_err();
    assert!(matches!(
        err,
        RoomServiceError::Validation(RoomValidationError::MissingTitle)
    ));
    assert!(service.list_rooms().unwrap().is_empty());
    assert_eq!(store.get_item(ROOMS_STORAGE_KEY).unwrap(), None);
}

#[test]
fn create_room_without_deadline_is_rejected() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));

    let mut input = request("No date", Vec::new());
    input.deadline = None;
    let err = service.create_room(input).unwrap_err();
    assert!(matches!(
        err,
        RoomServiceError::Validation(RoomValidationError::MissingDeadline)
    ));
    assert!(store.is_empty());
}

#[test]
fn create_room_rejects_bad_sub_tasks() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));

    let err = service
        .create_room(request("Bad", vec![NewSubTask::text("essay", 0)]))
        .unwrap_err();
    assert!(matches!(
        err,
        RoomServiceError::Validation(RoomValidationError::ZeroRequiredCharacters)
    ));

    let err = service
        .create_room(request("Bad", vec![NewSubTask::checkbox("   ")]))
        .unwrap_err();
    assert!(matches!(
        err,
        RoomServiceError::Validation(RoomValidationError::BlankSubTaskTitle)
    ));
    assert!(store.is_empty());
}

#[test]
fn sub_task_mutations_persist_recomputed_progress() {
    let conn = open_db_in_memory().unwrap();
    let service = RoomService::new(StoredRoomRepository::new(SqliteKeyValueStore::new(&conn)));
    let room = service
        .create_room(request(
            "Reading log",
            vec![
                NewSubTask::checkbox("Read"),
                NewSubTask::text("Reflect", 100),
                NewSubTask::checkbox("Discuss"),
                NewSubTask::checkbox("Present"),
            ],
        ))
        .unwrap();
    let ids: Vec<SubTaskId> = room.sub_tasks().iter().map(|t| t.id().clone()).collect();

    service
        .set_sub_task_checked(room.id(), &ids[0], true)
        .unwrap();
    let updated = service
        .update_sub_task_text(room.id(), &ids[1], "r".repeat(150))
        .unwrap();
    assert_eq!(updated.progress(), 50);

    let stored = service.get_room(room.id()).unwrap().unwrap();
    assert_eq!(stored, updated);
    assert_eq!(stored.completed_count(), 2);
}

#[test]
fn add_and_remove_sub_task_recompute_progress() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));
    let room = service
        .create_room(request("Grow", vec![NewSubTask::checkbox("one")]))
        .unwrap();
    let first = room.sub_tasks()[0].id().clone();
    service.set_sub_task_checked(room.id(), &first, true).unwrap();

    let grown = service
        .add_sub_task(room.id(), NewSubTask::checkbox("two"))
        .unwrap();
    assert_eq!(grown.progress(), 50);
    assert_eq!(grown.sub_tasks()[1].title(), "two");

    let second = grown.sub_tasks()[1].id().clone();
    let shrunk = service.remove_sub_task(room.id(), &second).unwrap();
    assert_eq!(shrunk.progress(), 100);
    assert_eq!(service.get_room(room.id()).unwrap().unwrap().progress(), 100);
}

#[test]
fn manual_override_is_persisted_until_next_mutation() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));
    let room = service
        .create_room(request("Slider", vec![NewSubTask::checkbox("only")]))
        .unwrap();
    let only = room.sub_tasks()[0].id().clone();

    service.override_progress(room.id(), 65).unwrap();
    assert_eq!(service.get_room(room.id()).unwrap().unwrap().progress(), 65);

    let toggled = service.set_sub_task_checked(room.id(), &only, false).unwrap();
    assert_eq!(toggled.progress(), 0);

    let err = service.override_progress(room.id(), 150).unwrap_err();
    assert!(matches!(
        err,
        RoomServiceError::Validation(RoomValidationError::ProgressOutOfRange(150))
    ));
}

#[test]
fn mutations_on_missing_targets_leave_storage_untouched() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));
    let room = service
        .create_room(request("Target", vec![NewSubTask::checkbox("tick")]))
        .unwrap();
    let snapshot = store.get_item(ROOMS_STORAGE_KEY).unwrap();

    let missing_room = RoomId::from("ghost");
    let err = service
        .set_sub_task_checked(&missing_room, &room.sub_tasks()[0].id().clone(), true)
        .unwrap_err();
    assert!(matches!(err, RoomServiceError::RoomNotFound(id) if id == missing_room));

    let missing_task = SubTaskId::from("ghost-task");
    let err = service
        .update_sub_task_text(room.id(), &missing_task, "text")
        .unwrap_err();
    assert!(matches!(
        err,
        RoomServiceError::SubTask(SubTaskMutationError::NotFound(_))
    ));

    assert_eq!(service.get_room(&missing_room).unwrap(), None);
    assert_eq!(store.get_item(ROOMS_STORAGE_KEY).unwrap(), snapshot);
}

#[test]
fn export_then_import_round_trips_and_replaces_in_place() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));
    let room = service
        .create_room(request(
            "Water  Cycle Project",
            vec![NewSubTask::text("Explain", 5)],
        ))
        .unwrap();
    service
        .create_room(request("Other", Vec::new()))
        .unwrap();
    let room = service
        .update_sub_task_text(room.id(), &room.sub_tasks()[0].id().clone(), "rain!")
        .unwrap();

    let export = service.export_room(room.id()).unwrap();
    assert_eq!(export.file_name, "water-cycle-project-room.json");

    let imported = service.import_room(&export.contents).unwrap();
    assert_eq!(imported.outcome, UpsertOutcome::Replaced);
    assert_eq!(imported.room, room);

    let rooms = service.list_rooms().unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0], room);
}

#[test]
fn import_with_new_id_appends() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));
    service.create_room(request("Existing", Vec::new())).unwrap();

    let payload = r#"{
      "id": "shared-room",
      "title": "Shared",
      "description": "from a colleague",
      "subTasks": [],
      "deadline": "2025-12-01T00:00:00.000Z",
      "createdAt": "2025-10-01T00:00:00.000Z",
      "progress": 0
    }"#;
    let imported = service.import_room(payload).unwrap();
    assert_eq!(imported.outcome, UpsertOutcome::Inserted);

    let rooms = service.list_rooms().unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[1].id(), &RoomId::from("shared-room"));
}

#[test]
fn malformed_import_leaves_storage_untouched() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));
    service.create_room(request("Keep me", Vec::new())).unwrap();
    let snapshot = store.get_item(ROOMS_STORAGE_KEY).unwrap();

    let err = service.import_room("{\"id\": 42}").unwrap_err();
    assert!(matches!(err, RoomServiceError::Import(ImportError::Malformed(_))));
    assert_eq!(store.get_item(ROOMS_STORAGE_KEY).unwrap(), snapshot);
}

#[test]
fn export_of_missing_room_is_not_found() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));
    let err = service.export_room(&RoomId::from("absent")).unwrap_err();
    assert!(matches!(err, RoomServiceError::RoomNotFound(_)));
}

#[test]
fn days_remaining_counts_from_now() {
    let store = MemoryKeyValueStore::new();
    let service = RoomService::new(StoredRoomRepository::new(&store));
    let room = service.create_room(request("Soon", Vec::new())).unwrap();

    assert_eq!(room.days_remaining(deadline() - Duration::days(3)), 3);
    assert_eq!(room.days_remaining(deadline() - Duration::hours(1)), 1);
}
