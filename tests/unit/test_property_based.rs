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
use flamewire_logdb::filter::Fields;
use flamewire_logdb::prelude::*;
use once_cell::sync::Lazy;
use proptest::prelude::*;
use tokio::runtime::Runtime;

static RT: Lazy<Runtime> = Lazy::new(|| Runtime::new().unwrap());

const BLOCKS: BlockNumber = 12;

/// Blocks 1..=12 with a mix of addresses, topics and recipients, some topic
/// slots left empty.
async fn seeded_store() -> LogStore {
    let store = memory_store().await;
    for number in 1..=BLOCKS {
        let mut batch = store.prepare(header(number));
        for tx in 0..2u8 {
            let count = (number as usize + tx as usize) % 3 + 1;
            let events: Vec<_> = (0..count)
                .map(|i| {
                    let k = (i + number as usize) % 3;
                    let topics = if k == 2 {
                        vec![hash(k as u8)]
                    } else {
                        vec![hash(k as u8), hash((k as u8 + 1) % 3)]
                    };
                    raw_event(addr(0xa0 + k as u8), &topics, &[number as u8, tx, i as u8])
                })
                .collect();
            let transfers: Vec<_> = (0..count)
                .map(|i| {
                    let k = ((i + tx as usize) % 3) as u8;
                    raw_transfer(addr(0x10 + k), addr(0x20 + (k + 1) % 3), i as u64)
                })
                .collect();
            batch
                .for_transaction(tx_id(number, tx), addr(0x01 + tx))
                .insert(&events, &transfers, u32::from(tx));
        }
        batch.commit().await.unwrap();
    }
    store
}

fn range_strategy() -> impl Strategy<Value = Option<Range>> {
    prop::option::of(
        (any::<bool>(), 0u64..=BLOCKS as u64 + 2, 0u64..=BLOCKS as u64 + 2).prop_map(
            |(time, from, to)| {
                if time {
                    Range::time(TIME_BASE + from * TIME_STEP, TIME_BASE + to * TIME_STEP)
                } else {
                    Range::blocks(from, to)
                }
            },
        ),
    )
}

fn order_strategy() -> impl Strategy<Value = Order> {
    prop_oneof![Just(Order::Asc), Just(Order::Desc)]
}

fn options_strategy() -> impl Strategy<Value = Option<Options>> {
    prop::option::of((0u64..40, 0u64..15).prop_map(|(offset, limit)| Options::new(offset, limit)))
}

fn event_criteria_strategy() -> impl Strategy<Value = EventCriteria> {
    (
        prop::option::of(0u8..4),
        prop::option::of(0u8..4),
        prop::option::of(0u8..4),
    )
        .prop_map(|(address, topic0, topic1)| {
            let mut criteria = EventCriteria {
                address: address.map(|k| addr(0xa0 + k)),
                ..Default::default()
            };
            criteria.topics[0] = topic0.map(hash);
            criteria.topics[1] = topic1.map(hash);
            criteria
        })
}

fn transfer_criteria_strategy() -> impl Strategy<Value = TransferCriteria> {
    (
        prop::option::of(0u8..3),
        prop::option::of(0u8..4),
        prop::option::of(0u8..4),
    )
        .prop_map(|(origin, sender, recipient)| TransferCriteria {
            tx_origin: origin.map(|k| addr(0x01 + k)),
            sender: sender.map(|k| addr(0x10 + k)),
            recipient: recipient.map(|k| addr(0x20 + k)),
        })
}

/// Reference selection: evaluate in memory, sort, then paginate.
fn select<R: Fields + Clone>(
    all: &[R],
    predicate: &flamewire_logdb::filter::Predicate,
    key: impl Fn(&R) -> (BlockNumber, u32),
    order: Order,
    options: Option<Options>,
) -> Vec<R> {
    let mut matched: Vec<R> = all
        .iter()
        .filter(|r| predicate.evaluate(*r))
        .cloned()
        .collect();
    matched.sort_by_key(&key);
    if order == Order::Desc {
        matched.reverse();
    }
    match options {
        Some(o) => matched
            .into_iter()
            .skip(o.offset as usize)
            .take(o.limit as usize)
            .collect(),
        None => matched,
    }
}

#[test]
fn prop_event_filter_matches_reference() {
    let store = RT.block_on(seeded_store());
    let all = RT.block_on(all_events(&store));

    proptest!(|(range in range_strategy(),
                criteria_set in prop::collection::vec(event_criteria_strategy(), 0..3),
                order in order_strategy(),
                options in options_strategy())| {
        let filter = EventFilter { range, criteria_set, order, options };
        let expected = select(
            &all,
            &filter.predicate(),
            |e: &Event| (e.block_number, e.index),
            order,
            options,
        );
        let found = RT
            .block_on(store.filter_events(&Context::background(), Some(&filter)))
            .unwrap();
        prop_assert_eq!(found, expected);
    });
}

#[test]
fn prop_transfer_filter_matches_reference() {
    let store = RT.block_on(seeded_store());
    let all = RT.block_on(all_transfers(&store));

    proptest!(|(range in range_strategy(),
                with_tx in prop::option::of((1..=BLOCKS, 0u8..3)),
                criteria_set in prop::collection::vec(transfer_criteria_strategy(), 0..3),
                order in order_strategy(),
                options in options_strategy())| {
        let filter = TransferFilter {
            tx_id: with_tx.map(|(n, tx)| tx_id(n, tx)),
            range,
            criteria_set,
            order,
            options,
        };
        let expected = select(
            &all,
            &filter.predicate(),
            |t: &Transfer| (t.block_number, t.index),
            order,
            options,
        );
        let found = RT
            .block_on(store.filter_transfers(&Context::background(), Some(&filter)))
            .unwrap();
        prop_assert_eq!(found, expected);
    });
}

#[test]
fn prop_open_range_has_no_upper_bound() {
    proptest!(|(from in 0u64..1_000, below in 1u64..1_000)| {
        let range = Range::blocks(from + below, from);
        prop_assert_eq!(range.upper(), None);
        let range = Range::blocks(from, from + below);
        prop_assert_eq!(range.upper(), Some(from + below));
    });
}
