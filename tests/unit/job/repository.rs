use super::*;
use crate::job::model::{Job, JobId, JobStatus};
use crate::timeline::emotion::Emotion;

fn image(path: &str) -> ImageRecord {
    ImageRecord {
        id: 0,
        path: path.into(),
        emotion: EmotionAnalysis::neutral_fallback(),
        aesthetic_score: Some(0.5),
        tags: vec![Tag {
            label: "beach".into(),
            relevance: 0.9,
        }],
        created_at: Utc::now(),
    }
}

#[test]
fn memory_ids_start_at_one_and_increase() {
    let repo = MemoryRepository::<Job>::new();
    let a = repo.create(Job::pending(1)).unwrap();
    let b = repo.create(Job::pending(2)).unwrap();
    assert_eq!(a.id, JobId(1));
    assert_eq!(b.id, JobId(2));
    assert_eq!(repo.list().unwrap().len(), 2);
    assert!(repo.get(3).unwrap().is_none());
}

#[test]
fn replace_swaps_whole_snapshot() {
    let repo = MemoryRepository::<Job>::new();
    let created = repo.create(Job::pending(1)).unwrap();
    let before = repo.get(created.id.0).unwrap().unwrap();

    let after = repo.replace(created.id.0, &|j: &Job| j.start()).unwrap();
    assert_eq!(after.status, JobStatus::Processing);
    assert_eq!(after.created_at, created.created_at);
    // earlier readers keep their consistent snapshot
    assert_eq!(before.status, JobStatus::Pending);
}

#[test]
fn failed_replace_leaves_record_untouched() {
    let repo = MemoryRepository::<Job>::new();
    let created = repo.create(Job::pending(1)).unwrap();
    let err = repo.replace(created.id.0, &|j: &Job| {
        j.start()?.start()
    });
    assert!(err.is_err());
    assert_eq!(repo.get(1).unwrap().unwrap().status, JobStatus::Pending);
    assert!(matches!(
        repo.replace(99, &|j: &Job| j.start()),
        Err(ReelError::Job(_))
    ));
}

#[test]
fn concurrent_creates_get_unique_ids() {
    let repo = Arc::new(MemoryRepository::<Job>::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = Arc::clone(&repo);
            std::thread::spawn(move || {
                (0..50)
                    .map(|_| repo.create(Job::pending(1)).unwrap().id.0)
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let mut ids: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 400);
    assert_eq!(ids.first(), Some(&1));
    assert_eq!(ids.last(), Some(&400));
}

#[test]
fn json_file_repository_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store/images.json");
    {
        let repo = JsonFileRepository::<ImageRecord>::open(&path).unwrap();
        let a = repo.create(image("a.jpg")).unwrap();
        repo.create(image("b.jpg")).unwrap();
        let mut changed = (*a).clone();
        changed.emotion.emotion = Emotion::Happy;
        repo.update(changed).unwrap();
    }

    let reopened = JsonFileRepository::<ImageRecord>::open(&path).unwrap();
    let all = reopened.list().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].emotion.emotion, Emotion::Happy);
    assert_eq!(all[1].path, PathBuf::from("b.jpg"));
    assert_eq!(reopened.create(image("c.jpg")).unwrap().id, 3);
}

#[test]
fn corrupt_store_is_a_serde_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(matches!(
        JsonFileRepository::<Job>::open(&path),
        Err(ReelError::Serde(_))
    ));
}
