/*
    Unslotted CSMA throughput (Kleinrock & Tobagi), G = offered load in
    frames per frame time, a = end-to-end propagation delay / frame time:

    non-persistent: S = G e^(-aG) / (G(1 + 2a) + e^(-aG))
    1-persistent:   S = G [1 + G + aG(1 + G + aG/2)] e^(-G(1 + 2a))
                        / (G(1 + 2a) - (1 - e^(-aG)) + (1 + aG) e^(-G(1 + a)))
 */

use log::info;

use crate::config::{BusConfig, SensingMode};

/// Normalised channel throughput `S` (successful frame time per unit time).
pub fn csma_throughput(mode: SensingMode, g: f64, a: f64) -> f64 {
    if g <= 0.0 {
        return 0.0;
    }
    match mode {
        SensingMode::NonPersistent => {
            let idle = (-a * g).exp();
            g * idle / (g * (1.0 + 2.0 * a) + idle)
        }
        SensingMode::Persistent => {
            let num = g * (1.0 + g + a * g * (1.0 + g + a * g / 2.0)) * (-g * (1.0 + 2.0 * a)).exp();
            let denom = g * (1.0 + 2.0 * a) - (1.0 - (-a * g).exp())
                + (1.0 + a * g) * (-g * (1.0 + a)).exp();
            num / denom
        }
    }
}

/// Offered load of the whole bus in frames per frame time.
pub fn offered_load(config: &BusConfig, node_count: usize) -> f64 {
    node_count as f64 * config.arrival_rate * config.transmission_duration
}

/// End-to-end propagation delay relative to the frame time.
pub fn propagation_ratio(config: &BusConfig, node_count: usize) -> f64 {
    let span = node_count.saturating_sub(1) as f64 * config.propagation_delay_per_hop;
    span / config.transmission_duration
}

/// Analytical throughput of `config` in bits per second.
pub fn expected_throughput(config: &BusConfig, node_count: usize) -> f64 {
    let g = offered_load(config, node_count);
    let a = propagation_ratio(config, node_count);
    let s = csma_throughput(config.sensing, g, a);
    info!(
        "Theoretical calculations: G: {:.4}, a: {:.2e}, S: {:.4}",
        g, a, s
    );
    s * config.frame_length_bits / config.transmission_duration
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_propagation_closed_forms() {
        let g: f64 = 1.5;
        let np = csma_throughput(SensingMode::NonPersistent, g, 0.0);
        assert!((np - g / (1.0 + g)).abs() < 1e-12);

        let p = csma_throughput(SensingMode::Persistent, g, 0.0);
        let expected = g * (1.0 + g) * (-g).exp() / (g + (-g).exp());
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn throughput_never_exceeds_offer_or_capacity() {
        for mode in [SensingMode::Persistent, SensingMode::NonPersistent] {
            for g in [0.01, 0.1, 0.5, 1.0, 2.0, 10.0, 100.0] {
                for a in [0.0, 0.001, 0.01, 0.1, 1.0] {
                    let s = csma_throughput(mode, g, a);
                    assert!(s >= 0.0 && s <= 1.0, "{:?} g={} a={} s={}", mode, g, a, s);
                    assert!(s <= g + 1e-12);
                }
            }
        }
    }

    #[test]
    fn persistent_collapses_under_heavy_load() {
        let a = 0.01;
        let heavy = 20.0;
        assert!(
            csma_throughput(SensingMode::NonPersistent, heavy, a)
                > csma_throughput(SensingMode::Persistent, heavy, a)
        );
        assert!(csma_throughput(SensingMode::Persistent, heavy, a) < 0.1);
    }

    #[test]
    fn load_from_config() {
        let config = BusConfig::default().with_arrival_rate(10.0);
        assert!((offered_load(&config, 20) - 0.3).abs() < 1e-12);
        let a = propagation_ratio(&config, 21);
        assert!((a - 20.0 * 5e-8 / 0.0015).abs() < 1e-15);
        assert_eq!(csma_throughput(SensingMode::Persistent, 0.0, a), 0.0);
        let bits = expected_throughput(&config, 20);
        assert!(bits > 0.0 && bits < 1_000_000.0);
    }
}
