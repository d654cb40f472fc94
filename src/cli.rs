use clap::Parser;

/// Flags the original Go tool spelled with a single dash.
const SINGLE_DASH_LONG_FLAGS: [&str; 3] = ["jwk", "hs256", "version"];

/// A JWT debugger
/// Decodes a JWT read from the arguments or stdin, verifies its signature
/// against a remote JWK set or an HS256 secret, and prints the claims as JSON.
#[derive(Parser, Debug)]
#[command(name = "jwtdebug", author, version, about, long_about = None, disable_version_flag = true)]
pub struct JwtDebugArgs {
    /// The JWT token to decode.
    /// Multiple values are joined with spaces. If not provided, it will be read from stdin.
    #[clap(name = "TOKEN")]
    pub token: Vec<String>,

    /// URL of the JWK set used to verify the signature
    #[clap(long = "jwk", value_name = "URL")]
    pub jwk_url: Option<String>,

    /// HMAC SHA-256 secret used to verify the signature, or the JWT_DEBUG_HS256 env variable
    #[clap(long = "hs256", value_name = "SECRET")]
    pub hs256: Option<String>,

    /// Display the current version
    #[clap(long = "version", short = 'v')]
    pub show_version: bool,
}

/// Rewrites Go style flags (`-jwk url`, `-hs256=secret`) into their double dash form.
/// Arguments after `--` are passed through untouched.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut end_of_flags = false;

    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || end_of_flags {
                return arg;
            }
            if arg == "--" {
                end_of_flags = true;
                return arg;
            }

            let Some(rest) = arg.strip_prefix('-') else {
                return arg;
            };
            let name = rest.split('=').next().unwrap_or(rest);
            if SINGLE_DASH_LONG_FLAGS.contains(&name) {
                format!("-{}", arg)
            } else {
                arg
            }
        })
        .collect()
}
