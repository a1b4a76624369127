// SPDX-License-Identifier: Apache-2.0
//! axum transport: `POST /graphql` for operations, `GET /graphql` for the
//! GraphiQL explorer (`spec.md` §6, following the teacher's
//! `Router::new().route(...).with_state(...)` wiring).

use crate::schema::ApiSchema;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::GraphQL;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// Build the router exposing the schema at `/graphql`.
pub fn router(schema: ApiSchema) -> Router {
    Router::new().route("/graphql", get(graphiql).post_service(GraphQL::new(schema)))
}
