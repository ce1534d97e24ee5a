//! Concurrency guarantees of the in-memory repository.

use std::sync::Arc;

use chrono::Utc;
use promptdash_core::error::CoreError;
use promptdash_core::migration::{Migration, NewMigration};
use promptdash_core::status::{validate_transition, MigrationStatus};
use promptdash_db::{JobRepository, MemoryRepository};

fn draft() -> Migration {
    Migration::draft(
        NewMigration {
            name: "race".into(),
            source_model: "X".into(),
            target_model: "Y".into(),
            prompts: vec!["a".into(), "b".into(), "c".into()],
            notes: None,
        },
        Utc::now(),
    )
}

// ---------------------------------------------------------------------------
// Test: check-and-set inside `update` admits exactly one winner
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn only_one_concurrent_transition_wins() {
    let repo = Arc::new(MemoryRepository::<Migration>::new());
    let id = repo.create(draft()).await.unwrap().id;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let repo = Arc::clone(&repo);
        tasks.push(tokio::spawn(async move {
            repo.update(
                id,
                Box::new(move |m: &mut Migration| {
                    validate_transition("Migration", id, m.status, MigrationStatus::Running)?;
                    m.status = MigrationStatus::Running;
                    Ok(())
                }),
            )
            .await
        }));
    }

    let mut wins = 0;
    let mut rejections = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => wins += 1,
            Err(CoreError::InvalidTransition { .. }) => rejections += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(wins, 1);
    assert_eq!(rejections, 15);
}

// ---------------------------------------------------------------------------
// Test: readers never observe a partially rewritten prompt list
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_see_all_or_nothing_prompt_rewrites() {
    let repo = Arc::new(MemoryRepository::<Migration>::new());
    let id = repo.create(draft()).await.unwrap().id;

    let reader = {
        let repo = Arc::clone(&repo);
        tokio::spawn(async move {
            for _ in 0..500 {
                let snapshot = repo.get(id).await.unwrap().unwrap();
                let migrated = snapshot
                    .prompts
                    .iter()
                    .filter(|p| p.migrated.is_some())
                    .count();
                assert!(migrated == 0 || migrated == snapshot.prompts.len());
                tokio::task::yield_now().await;
            }
        })
    };

    repo.update(
        id,
        Box::new(|m: &mut Migration| {
            let target = m.target_model.clone();
            for prompt in m.prompts.iter_mut() {
                prompt.migrated = Some(format!("{} (migrated to {target})", prompt.source));
            }
            m.status = MigrationStatus::Completed;
            Ok(())
        }),
    )
    .await
    .unwrap();

    reader.await.unwrap();
    let done = repo.get(id).await.unwrap().unwrap();
    assert!(done.prompts.iter().all(|p| p.migrated.is_some()));
}
