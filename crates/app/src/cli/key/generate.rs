use clap::Args;
use tessera_app::crypto::Keyring;

use super::KeyFileArgs;

#[derive(Debug, Args)]
pub(crate) struct GenerateKeyArgs {
    #[command(flatten)]
    key_file: KeyFileArgs,
}

pub(crate) fn run(args: &GenerateKeyArgs) -> Result<(), String> {
    let path = &args.key_file.signing_key_path;

    if path.exists() {
        return Err(format!(
            "{} already exists; remove it first to replace the signing key",
            path.display()
        ));
    }

    let keyring = Keyring::load_or_generate(args.key_file.server_name.clone(), path)
        .map_err(|error| format!("failed to generate signing key: {error}"))?;

    println!("key_file: {}", path.display());
    println!("key_id: {}", keyring.key_id());
    println!("public_key: {}", keyring.public_key_base64());

    Ok(())
}
