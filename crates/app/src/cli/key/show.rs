use clap::Args;
use tessera_app::crypto::Keyring;

use super::KeyFileArgs;

#[derive(Debug, Args)]
pub(crate) struct ShowKeyArgs {
    #[command(flatten)]
    key_file: KeyFileArgs,
}

pub(crate) fn run(args: &ShowKeyArgs) -> Result<(), String> {
    let path = &args.key_file.signing_key_path;

    if !path.exists() {
        return Err(format!("{} does not exist", path.display()));
    }

    let keyring = Keyring::load_or_generate(args.key_file.server_name.clone(), path)
        .map_err(|error| format!("failed to load signing key: {error}"))?;

    println!("server_name: {}", keyring.server_name());
    println!("key_id: {}", keyring.key_id());
    println!("public_key: {}", keyring.public_key_base64());

    Ok(())
}
