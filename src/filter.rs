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

//! Structured filters and the predicate tree they compile to.
//!
//! A filter selects `Range AND (Group1 OR Group2 OR ...)` where every group
//! is a conjunction of equality constraints. Filters are first lowered into
//! a [`Predicate`] tree, which is then either rendered into a parameterized
//! SQL statement or evaluated directly against a decoded record.

use crate::codec::to_sql_int;
use crate::storage::Table;
use crate::types::{Address, Event, Transfer, B256, TOPIC_SLOTS};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeUnit {
    #[default]
    Block,
    Time,
}

/// Inclusive range over block numbers or block timestamps.
///
/// When `to < from` the range is open above `from`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    #[serde(default)]
    pub unit: RangeUnit,
    pub from: u64,
    pub to: u64,
}

impl Range {
    pub const fn blocks(from: u64, to: u64) -> Self {
        Self {
            unit: RangeUnit::Block,
            from,
            to,
        }
    }

    pub const fn time(from: u64, to: u64) -> Self {
        Self {
            unit: RangeUnit::Time,
            from,
            to,
        }
    }

    pub const fn upper(&self) -> Option<u64> {
        if self.to >= self.from {
            Some(self.to)
        } else {
            None
        }
    }

    fn predicate(&self) -> Predicate {
        let column = match self.unit {
            RangeUnit::Block => Column::BlockNumber,
            RangeUnit::Time => Column::BlockTime,
        };
        let mut bounds = vec![Predicate::Ge(column, to_sql_int(self.from))];
        if let Some(to) = self.upper() {
            bounds.push(Predicate::Le(column, to_sql_int(to)));
        }
        Predicate::all(bounds)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    pub offset: u64,
    pub limit: u64,
}

impl Options {
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCriteria {
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub topics: [Option<B256>; TOPIC_SLOTS],
}

impl EventCriteria {
    pub fn address(address: Address) -> Self {
        Self {
            address: Some(address),
            ..Self::default()
        }
    }

    /// Constrain topic slot `slot`. Slots past the last one are ignored.
    pub fn topic(mut self, slot: usize, topic: B256) -> Self {
        if let Some(entry) = self.topics.get_mut(slot) {
            *entry = Some(topic);
        }
        self
    }

    fn predicate(&self) -> Predicate {
        let mut terms = Vec::new();
        if let Some(address) = self.address {
            terms.push(Predicate::eq_bytes(Column::Address, address.as_slice()));
        }
        for (slot, topic) in self.topics.iter().enumerate() {
            if let Some(topic) = topic {
                terms.push(Predicate::eq_bytes(Column::Topic(slot), topic.as_slice()));
            }
        }
        Predicate::all(terms)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCriteria {
    #[serde(default)]
    pub tx_origin: Option<Address>,
    #[serde(default)]
    pub sender: Option<Address>,
    #[serde(default)]
    pub recipient: Option<Address>,
}

impl TransferCriteria {
    fn predicate(&self) -> Predicate {
        let terms = [
            (Column::TxOrigin, self.tx_origin),
            (Column::Sender, self.sender),
            (Column::Recipient, self.recipient),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|a| Predicate::eq_bytes(column, a.as_slice())))
        .collect();
        Predicate::all(terms)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    #[serde(default)]
    pub range: Option<Range>,
    #[serde(default)]
    pub criteria_set: Vec<EventCriteria>,
    #[serde(default)]
    pub order: Order,
    #[serde(default)]
    pub options: Option<Options>,
}

impl EventFilter {
    pub fn predicate(&self) -> Predicate {
        let groups = self.criteria_set.iter().map(EventCriteria::predicate).collect();
        Predicate::all(vec![range_predicate(self.range), Predicate::any_group(groups)])
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFilter {
    #[serde(default)]
    pub tx_id: Option<B256>,
    #[serde(default)]
    pub range: Option<Range>,
    #[serde(default)]
    pub criteria_set: Vec<TransferCriteria>,
    #[serde(default)]
    pub order: Order,
    #[serde(default)]
    pub options: Option<Options>,
}

impl TransferFilter {
    pub fn predicate(&self) -> Predicate {
        let groups = self
            .criteria_set
            .iter()
            .map(TransferCriteria::predicate)
            .collect();
        let tx = match self.tx_id {
            Some(id) => Predicate::eq_bytes(Column::TxId, id.as_slice()),
            None => Predicate::Always,
        };
        Predicate::all(vec![
            range_predicate(self.range),
            tx,
            Predicate::any_group(groups),
        ])
    }
}

fn range_predicate(range: Option<Range>) -> Predicate {
    range.map(|r| r.predicate()).unwrap_or(Predicate::Always)
}

/// A filterable column of either record table. Topic slots are
/// `0..TOPIC_SLOTS`; other slots name no column and never match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    BlockNumber,
    BlockTime,
    TxId,
    TxOrigin,
    Address,
    Topic(usize),
    Sender,
    Recipient,
}

impl Column {
    pub fn name(self) -> Option<&'static str> {
        const TOPICS: [&str; TOPIC_SLOTS] = ["topic0", "topic1", "topic2", "topic3", "topic4"];
        match self {
            Self::BlockNumber => Some("block_number"),
            Self::BlockTime => Some("block_time"),
            Self::TxId => Some("tx_id"),
            Self::TxOrigin => Some("tx_origin"),
            Self::Address => Some("address"),
            Self::Topic(slot) => TOPICS.get(slot).copied(),
            Self::Sender => Some("sender"),
            Self::Recipient => Some("recipient"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bytes(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    Always,
    Ge(Column, i64),
    Le(Column, i64),
    Eq(Column, Value),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    fn eq_bytes(column: Column, bytes: &[u8]) -> Self {
        Self::Eq(column, Value::Bytes(bytes.to_vec()))
    }

    /// Conjunction with `Always` terms folded away.
    fn all(terms: Vec<Predicate>) -> Self {
        let mut terms: Vec<_> = terms.into_iter().filter(|t| *t != Self::Always).collect();
        match terms.len() {
            0 => Self::Always,
            1 => terms.remove(0),
            _ => Self::And(terms),
        }
    }

    /// Disjunction of criteria groups; no groups means no constraint.
    fn any_group(groups: Vec<Predicate>) -> Self {
        if groups.is_empty() || groups.contains(&Self::Always) {
            return Self::Always;
        }
        if groups.len() == 1 {
            return groups.into_iter().next().unwrap_or(Self::Always);
        }
        Self::Or(groups)
    }

    /// Render as a SQL boolean expression, binding every value.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Self::Always => {
                qb.push("1");
            }
            Self::Ge(column, value) => {
                if push_column(qb, *column) {
                    qb.push(" >= ").push_bind(*value);
                }
            }
            Self::Le(column, value) => {
                if push_column(qb, *column) {
                    qb.push(" <= ").push_bind(*value);
                }
            }
            Self::Eq(column, Value::Int(value)) => {
                if push_column(qb, *column) {
                    qb.push(" = ").push_bind(*value);
                }
            }
            Self::Eq(column, Value::Bytes(value)) => {
                if push_column(qb, *column) {
                    qb.push(" = ").push_bind(value.clone());
                }
            }
            Self::And(terms) => push_joined(qb, terms, " AND ", "1"),
            Self::Or(terms) => push_joined(qb, terms, " OR ", "0"),
        }
    }

    /// Evaluate against a decoded record. Missing fields never match.
    pub fn evaluate<R: Fields>(&self, record: &R) -> bool {
        match self {
            Self::Always => true,
            Self::Ge(column, bound) => {
                matches!(record.field(*column), Some(Value::Int(v)) if v >= *bound)
            }
            Self::Le(column, bound) => {
                matches!(record.field(*column), Some(Value::Int(v)) if v <= *bound)
            }
            Self::Eq(column, value) => record.field(*column).as_ref() == Some(value),
            Self::And(terms) => terms.iter().all(|t| t.evaluate(record)),
            Self::Or(terms) => terms.iter().any(|t| t.evaluate(record)),
        }
    }
}

/// Push the column name, or a false literal when the column does not exist.
fn push_column(qb: &mut QueryBuilder<'_, Sqlite>, column: Column) -> bool {
    match column.name() {
        Some(name) => {
            qb.push(name);
            true
        }
        None => {
            qb.push("0");
            false
        }
    }
}

fn push_joined(qb: &mut QueryBuilder<'_, Sqlite>, terms: &[Predicate], sep: &str, empty: &str) {
    if terms.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            qb.push(sep);
        }
        term.push_sql(qb);
    }
    qb.push(")");
}

/// Column access for in-memory predicate evaluation.
pub trait Fields {
    fn field(&self, column: Column) -> Option<Value>;
}

fn bytes(slice: &[u8]) -> Option<Value> {
    Some(Value::Bytes(slice.to_vec()))
}

impl Fields for Event {
    fn field(&self, column: Column) -> Option<Value> {
        match column {
            Column::BlockNumber => Some(Value::Int(i64::from(self.block_number))),
            Column::BlockTime => Some(Value::Int(to_sql_int(self.block_time))),
            Column::TxId => bytes(self.tx_id.as_slice()),
            Column::TxOrigin => bytes(self.tx_origin.as_slice()),
            Column::Address => bytes(self.address.as_slice()),
            Column::Topic(slot) => self
                .topics
                .get(slot)
                .copied()
                .flatten()
                .and_then(|t| bytes(t.as_slice())),
            Column::Sender | Column::Recipient => None,
        }
    }
}

impl Fields for Transfer {
    fn field(&self, column: Column) -> Option<Value> {
        match column {
            Column::BlockNumber => Some(Value::Int(i64::from(self.block_number))),
            Column::BlockTime => Some(Value::Int(to_sql_int(self.block_time))),
            Column::TxId => bytes(self.tx_id.as_slice()),
            Column::TxOrigin => bytes(self.tx_origin.as_slice()),
            Column::Sender => bytes(self.sender.as_slice()),
            Column::Recipient => bytes(self.recipient.as_slice()),
            Column::Address | Column::Topic(_) => None,
        }
    }
}

/// A compiled selection over one record table.
#[derive(Clone, Debug)]
pub struct Query {
    table: Table,
    predicate: Predicate,
    order: Order,
    options: Option<Options>,
}

impl Query {
    pub fn events(filter: Option<&EventFilter>) -> Self {
        match filter {
            Some(f) => Self {
                table: Table::Event,
                predicate: f.predicate(),
                order: f.order,
                options: f.options,
            },
            None => Self::unfiltered(Table::Event),
        }
    }

    pub fn transfers(filter: Option<&TransferFilter>) -> Self {
        match filter {
            Some(f) => Self {
                table: Table::Transfer,
                predicate: f.predicate(),
                order: f.order,
                options: f.options,
            },
            None => Self::unfiltered(Table::Transfer),
        }
    }

    fn unfiltered(table: Table) -> Self {
        Self {
            table,
            predicate: Predicate::Always,
            order: Order::Asc,
            options: None,
        }
    }

    pub fn build<'a>(&self) -> QueryBuilder<'a, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(self.table.columns().join(", "))
            .push(" FROM ")
            .push(self.table.name())
            .push(" WHERE ");
        self.predicate.push_sql(&mut qb);

        let order = self.order.sql();
        qb.push(format!(
            " ORDER BY block_number {order}, {} {order}",
            self.table.index_column()
        ));

        if let Some(options) = self.options {
            qb.push(" LIMIT ")
                .push_bind(to_sql_int(options.limit))
                .push(" OFFSET ")
                .push_bind(to_sql_int(options.offset));
        }
        qb
    }
}
