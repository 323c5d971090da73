//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements         | Connects to                  |
//! |-----------------|--------------------|------------------------------|
//! | `device`        | ActuatorPort       | LED strip                    |
//! |                 | DisplayPort        | LED strip, weather renderer  |
//! |                 | UpdateSourcePort   | GitHub releases, OTA slots   |
//! |                 | SystemPort         | chip reset                   |
//! | `http_server`   | (inbound)          | ESP-IDF HTTP server          |
//! | `log_sink`      | EventSink          | Serial log output            |
//! | `nvs`           | StoragePort        | NVS / in-memory store        |
//! | `release`       | (parsing)          | release document JSON        |
//! | `strip`         | ActuatorPort       | RMT TX channel (WS2812)      |
//! |                 | DisplayPort        |                              |
//! | `time`          | (clock)            | ESP32 system timer           |
//! | `update_source` | UpdateSourcePort   | HTTPS client + esp-ota       |
//! | `wifi`          | (bring-up)         | ESP-IDF WiFi STA / SoftAP    |

pub mod device;
#[cfg(target_os = "espidf")]
pub mod http_server;
pub mod log_sink;
pub mod nvs;
pub mod release;
pub mod strip;
pub mod time;
pub mod update_source;
pub mod wifi;
