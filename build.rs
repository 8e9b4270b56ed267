use std::{env, error::Error, fs, path::Path};

use serde::Deserialize;

#[derive(Deserialize)]
struct RawConfig {
    wifi_ssid: String,
    wifi_psk: String,
    mqtt_hostname: String,
    mqtt_port: u16,
    #[serde(default)]
    mqtt_username: String,
    #[serde(default)]
    mqtt_password: String,
    user_id: String,
    device_id: String,
    pub_interval_ms: Option<i64>,
    #[serde(default)]
    provisioned: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Tell Cargo to rerun if toml changes
    println!("cargo:rerun-if-changed=cfg.toml");
    println!("cargo:rerun-if-changed=cfg.toml.example");

    // Read and parse
    let toml_str = match fs::read_to_string("cfg.toml") {
        Ok(s) => s,
        Err(_) => {
            println!("cargo:warning=cfg.toml not found, building with cfg.toml.example");
            fs::read_to_string("cfg.toml.example")?
        }
    };
    let raw: RawConfig = toml::from_str(&toml_str)?;

    // Generate Rust code
    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    let code = format!(
        r#"
        pub const CONFIG: Config = Config {{
            wifi_ssid: {ssid:?},
            wifi_psk: {psk:?},
            device: DeviceConfig {{
                broker_host: {mh:?},
                broker_port: {mp},
                broker_username: {mu:?},
                broker_password: {mpw:?},
                user_id: {uid:?},
                device_id: {did:?},
                pub_interval_ms: {intv:?},
                provisioned: {prov},
            }},
        }};
    "#,
        ssid = raw.wifi_ssid,
        psk = raw.wifi_psk,
        mh = raw.mqtt_hostname,
        mp = raw.mqtt_port,
        mu = raw.mqtt_username,
        mpw = raw.mqtt_password,
        uid = raw.user_id,
        did = raw.device_id,
        intv = raw.pub_interval_ms,
        prov = raw.provisioned,
    );

    fs::write(dest_path, code)?;
    Ok(())
}
