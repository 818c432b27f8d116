use candle_core::Device;
use tracing::{debug, info, warn};

/// Picks the compute device for the CLIP encoder.
///
/// Accelerators are tried in feature order (Metal, then CUDA). `force_cpu` skips them.
/// Falling back to CPU is never an error; callers cannot observe which device ran.
pub fn select_device(force_cpu: bool) -> Device {
    if force_cpu {
        debug!("CPU device forced by configuration");
        return Device::Cpu;
    }

    let mut failures: Vec<String> = Vec::new();

    for (name, probe) in accelerator_probes() {
        match probe() {
            Ok(device) => {
                info!(device = name, "Using GPU acceleration for CLIP encoder");
                return device;
            }
            Err(e) => {
                warn!(device = name, error = %e, "Accelerator unavailable");
                failures.push(format!("{name} failed: {e}"));
            }
        }
    }

    let reason = if failures.is_empty() {
        "no GPU backend compiled".to_string()
    } else {
        failures.join("; ")
    };

    warn!(reason = %reason, "Falling back to CPU device");
    Device::Cpu
}

type Probe = fn() -> candle_core::Result<Device>;

fn accelerator_probes() -> Vec<(&'static str, Probe)> {
    #[allow(unused_mut)]
    let mut probes: Vec<(&'static str, Probe)> = Vec::new();

    #[cfg(feature = "metal")]
    probes.push(("metal", || Device::new_metal(0)));

    #[cfg(feature = "cuda")]
    probes.push(("cuda", || Device::new_cuda(0)));

    probes
}
