//! Fuzz target: persisted config document decoding
//!
//! Writes arbitrary bytes where the config document lives and opens the
//! store on top of them.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Whatever loads passes the same rules a form submission does
//! - A document that fails `validate_record` loads as the factory default
//!
//! cargo fuzz run fuzz_config_document

#![no_main]

use libfuzzer_sys::fuzz_target;
use lightworks::adapters::nvs::NvsAdapter;
use lightworks::app::config_store::{self, ConfigStore, CONFIG_KEY, CONFIG_NAMESPACE, MAX_DOCUMENT_SIZE};
use lightworks::app::fields::validate_record;
use lightworks::app::ports::StoragePort;
use lightworks::config::DeviceConfig;
use lightworks::platform::{AppRole, FirmwareProfile, HardwareVariant};

fuzz_target!(|data: &[u8]| {
    let profile = FirmwareProfile::new(HardwareVariant::Esp32, AppRole::Map);
    let Ok(mut nvs) = NvsAdapter::new() else { return };
    if nvs.write(CONFIG_NAMESPACE, CONFIG_KEY, data).is_err() {
        return;
    }

    let store = ConfigStore::open(nvs, profile);
    assert!(validate_record(store.current(), &profile).is_ok());

    let accepted = Some(data)
        .filter(|d| d.len() <= MAX_DOCUMENT_SIZE)
        .and_then(config_store::decode)
        .filter(|record| validate_record(record, &profile).is_ok());
    match accepted {
        Some(record) => assert_eq!(store.current(), &record),
        None => assert_eq!(store.current(), &DeviceConfig::factory_default(AppRole::Map)),
    }
});
