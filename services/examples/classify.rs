//! Natural language classifier example.
//!
//! Run with:
//! ```bash
//! export NLC_APIKEY="your-api-key"
//! export NLC_CLASSIFIER_ID="10D41B-nlc-1"
//! cargo run -p cogsdk-services --example classify
//! ```

use std::env;

use cogsdk_services::{Credentials, NaturalLanguageClassifier, classifier, dispatch};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = env::var("NLC_APIKEY").expect("NLC_APIKEY environment variable not set");
    let classifier_id =
        env::var("NLC_CLASSIFIER_ID").expect("NLC_CLASSIFIER_ID environment variable not set");
    let url = env::var("NLC_URL").unwrap_or_else(|_| classifier::DEFAULT_URL.to_string());

    let nlc = NaturalLanguageClassifier::new(Credentials::api_key(url, api_key)?)?;

    // Example 1: classifier status
    println!("Example 1: Classifier status");
    println!("---");

    let info = nlc.get_classifier(&classifier_id).await?.into_payload();
    println!("{} is {:?}", info.classifier_id, info.status);
    if !info.status.is_available() {
        println!("Classifier is not available yet, try again later.");
        return Ok(());
    }

    // Example 2: classify
    println!("\nExample 2: Classify text");
    println!("---");

    let resp = nlc.classify(&classifier_id, "Is it hot outside?").await?;
    println!("Top class: {}", resp.payload.top_class);
    for class in &resp.payload.classes {
        println!("  {}: {:.3}", class.class_name, class.confidence);
    }

    // Example 3: the same call with handlers instead of await
    println!("\nExample 3: Classify with handlers");
    println!("---");

    let nlc = std::sync::Arc::new(nlc);
    let call = {
        let nlc = nlc.clone();
        let id = classifier_id.clone();
        async move { nlc.classify(&id, "Will it rain tomorrow?").await }
    };
    dispatch(
        call,
        |resp| println!("Top class: {} (raw: {})", resp.payload.top_class, resp.raw_json()),
        |err| eprintln!("Classify failed: {}", err),
    )
    .await?;

    Ok(())
}
