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

use flamewire_logdb::prelude::{
    Address, BigUint, BlockHeader, Bytes, Context, EventCriteria, EventFilter, LogStore, Options,
    Order, RawEvent, RawTransfer, Range, TransferCriteria, TransferFilter, B256,
};
use std::time::Duration;

const TOKEN: Address = Address::repeat_byte(0xee);
const TRANSFER_TOPIC: B256 = B256::repeat_byte(0xdd);

fn header(number: u32) -> BlockHeader {
    let mut id = [0u8; 32];
    id[..4].copy_from_slice(&number.to_be_bytes());
    BlockHeader::new(number, B256::from(id), 1_530_000_000 + u64::from(number) * 10)
}

/// Index one block that moves native value and emits a matching token event.
async fn index_block(
    store: &LogStore,
    number: u32,
    from: Address,
    to: Address,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut batch = store.prepare(header(number));
    let tx_id = B256::left_padding_from(&number.to_be_bytes());
    batch.for_transaction(tx_id, from).insert(
        &[RawEvent {
            address: TOKEN,
            topics: vec![TRANSFER_TOPIC, from.into_word(), to.into_word()],
            data: Bytes::from(u64::from(number).to_be_bytes().to_vec()),
        }],
        &[RawTransfer {
            sender: from,
            recipient: to,
            amount: BigUint::from(number) * 1_000_000_000u64,
        }],
        0,
    );
    batch.commit().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let store = LogStore::open_in_memory().await?;
    let alice = Address::repeat_byte(0xa1);
    let bob = Address::repeat_byte(0xb0);

    for number in 1..=6 {
        let (from, to) = if number % 2 == 0 { (alice, bob) } else { (bob, alice) };
        index_block(&store, number, from, to).await?;
    }
    println!("Indexed up to block {}", store.last_indexed_block().await?);

    // A reorg replaces block 5 and everything after it.
    index_block(&store, 5, alice, alice).await?;
    println!(
        "After reorg: indexed up to block {}",
        store.last_indexed_block().await?
    );

    let ctx = Context::with_timeout(Duration::from_secs(5));

    let sent_by_alice = EventFilter {
        range: Some(Range::blocks(2, 5)),
        criteria_set: vec![EventCriteria::address(TOKEN)
            .topic(0, TRANSFER_TOPIC)
            .topic(1, alice.into_word())],
        order: Order::Desc,
        options: None,
    };
    for event in store.filter_events(&ctx, Some(&sent_by_alice)).await? {
        println!(
            "Block {} event #{} from {}",
            event.block_number, event.index, event.address
        );
    }

    let to_bob = TransferFilter {
        criteria_set: vec![TransferCriteria {
            recipient: Some(bob),
            ..Default::default()
        }],
        options: Some(Options::new(0, 2)),
        ..Default::default()
    };
    for transfer in store.filter_transfers(&ctx, Some(&to_bob)).await? {
        println!(
            "Block {} -> {} sent {} wei to {}",
            transfer.block_number, transfer.sender, transfer.amount, transfer.recipient
        );
    }

    store.close().await;
    Ok(())
}
