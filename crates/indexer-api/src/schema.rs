// SPDX-License-Identifier: Apache-2.0
//! Schema assembly: wires [`QueryRoot`] and [`MutationRoot`] together with
//! the shared [`ApiContext`].

use crate::context::ApiContext;
use crate::mutation::MutationRoot;
use crate::query::QueryRoot;
use async_graphql::{EmptySubscription, Schema};

/// The concrete schema type this crate serves. There is no subscription
/// root (`spec.md` §6 names only queries and mutations).
pub type ApiSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema, installing `context` as shared resolver data.
pub fn build_schema(context: ApiContext) -> ApiSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).data(context).finish()
}
