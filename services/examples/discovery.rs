//! Discovery example: create a collection, upload a document, query it.
//!
//! Run with:
//! ```bash
//! export DISCOVERY_APIKEY="your-api-key"
//! cargo run -p cogsdk-services --example discovery
//! ```

use std::{env, time::Duration};

use cogsdk_services::{
    CollectionOperations, CreateCollection, Credentials, Discovery, QueryOptions, discovery,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key =
        env::var("DISCOVERY_APIKEY").expect("DISCOVERY_APIKEY environment variable not set");
    let discovery = Discovery::new(Credentials::api_key(discovery::DEFAULT_URL, api_key)?)?;

    let envs = discovery.list_environments().await?.into_payload();
    let Some(environment) = envs.writable() else {
        println!("No writable environment found.");
        return Ok(());
    };
    println!("Using environment {} ({:?})", environment.environment_id, environment.status);

    let create = CreateCollection {
        name: "cogsdk-example".to_string(),
        description: Some("Created by the discovery example".to_string()),
        ..Default::default()
    };
    let collection = discovery
        .create_collection(&environment.environment_id, &create)
        .await?
        .into_payload();
    println!("Created collection {}", collection.collection_id);

    // Wait for the collection to become active.
    loop {
        let current = discovery
            .get_collection(&environment.environment_id, &collection.collection_id)
            .await?
            .into_payload();
        if current.status.is_active() {
            break;
        }
        println!("Collection is {:?}, waiting...", current.status);
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    let accepted = discovery
        .add_document(
            &environment.environment_id,
            &collection.collection_id,
            "<html><body><h1>Rust</h1><p>Rust is a systems language.</p></body></html>",
            "rust.html",
            "text/html",
            Some(&json!({ "source": "example" })),
        )
        .await?
        .into_payload();
    println!("Document {} is {:?}", accepted.document_id, accepted.status);

    let options = QueryOptions {
        natural_language_query: Some("what is rust".to_string()),
        count: Some(3),
        ..Default::default()
    };
    let results = discovery
        .query(&environment.environment_id, &collection.collection_id, &options)
        .await?
        .into_payload();
    println!("{} matching results", results.matching_results);

    discovery
        .delete_collection(&environment.environment_id, &collection.collection_id)
        .await?;
    println!("Deleted collection {}", collection.collection_id);

    Ok(())
}
