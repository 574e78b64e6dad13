//! Walks through issuing a UAE PASS login redirect and shows that a forged callback is refused
//! before any provider call.

// crates.io
use color_eyre::Result;
// self
use uaepass_broker::{
	config::{ClientConfig, Environment},
	error::Error,
	flows::{CallbackParams, ReqwestBroker},
	store::MemoryAttemptStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ClientConfig::builder("sandbox_stage")
		.environment(Environment::Staging)
		.client_secret("sandbox_stage")
		.redirect_uri("https://app.example.com/callback")
		.build()?;
	let broker = ReqwestBroker::new(config)?;
	let attempts = MemoryAttemptStore::default();
	let redirect = broker.begin_login(&attempts).await?;

	println!("Send your user to {}.", redirect.authorize_url);
	println!("Remember attempt `{}` in an HttpOnly cookie.", redirect.attempt_id);

	// Simulate a callback whose `state` was not issued by this login.
	let forged = CallbackParams {
		code: Some("stolen-code".into()),
		state: Some("attacker-state".into()),
		..Default::default()
	};

	match broker.complete_login(&attempts, &redirect.attempt_id, forged).await {
		Err(Error::StateMismatch) => println!("Forged callback refused before the token exchange."),
		other => eprintln!("Unexpected outcome: {other:?}."),
	}

	println!("Sign users out via {}.", broker.logout_url(Some("https://app.example.com/")));

	Ok(())
}
