/*
 * Copyright 2025 Flamewire
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use crate::common::*;
use flamewire_logdb::prelude::*;
use futures::future::join_all;
use std::collections::BTreeMap;
use tempfile::tempdir;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commits_are_serialized() {
    let dir = tempdir().unwrap();
    let store = LogStore::open(dir.path().join("logs.db")).await.unwrap();

    // Each commit truncates at its own height, so which blocks survive
    // depends on the order the writer lock was granted.
    let tasks = (1..=8u32).map(|n| {
        let store = store.clone();
        tokio::spawn(async move { commit_block(&store, n * 10, 3, 2).await })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    // Whatever the interleaving, each block's records are whole.
    let mut per_block: BTreeMap<BlockNumber, Vec<u32>> = BTreeMap::new();
    for event in all_events(&store).await {
        per_block.entry(event.block_number).or_default().push(event.index);
    }
    assert!(!per_block.is_empty());
    for indexes in per_block.values() {
        assert_eq!(indexes, &vec![0, 1, 2]);
    }

    // The marker names the last commit to run, which is also the highest
    // block still stored.
    let marker = store.last_indexed_block().await.unwrap();
    assert_eq!(per_block.keys().next_back().copied(), Some(marker));
    store.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_see_whole_blocks_during_writes() {
    let dir = tempdir().unwrap();
    let store = LogStore::open(dir.path().join("logs.db")).await.unwrap();
    commit_range(&store, 1..=5, 4, 4).await;

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for round in 0..20 {
                let height = 3 + (round % 3);
                commit_block(&store, height, 4, 4).await.unwrap();
            }
        })
    };

    let readers = (0..4).map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                let events = store
                    .filter_events(&Context::background(), None)
                    .await
                    .unwrap();
                let mut per_block: BTreeMap<BlockNumber, usize> = BTreeMap::new();
                for event in &events {
                    *per_block.entry(event.block_number).or_default() += 1;
                }
                assert!(per_block.values().all(|count| *count == 4));
                // Truncation removes everything above the committed height,
                // so stored heights are always contiguous from 1.
                let heights: Vec<_> = per_block.keys().copied().collect();
                let expected: Vec<BlockNumber> = (1..=heights.len() as BlockNumber).collect();
                assert_eq!(heights, expected);
            }
        })
    });

    for reader in join_all(readers).await {
        reader.unwrap();
    }
    writer.await.unwrap();
    store.close().await;
}
