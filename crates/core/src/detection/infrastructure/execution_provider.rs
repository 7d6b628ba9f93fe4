use ort::execution_providers::ExecutionProviderDispatch;

/// Accelerators to register for the face detector session, best first.
///
/// An empty list leaves ONNX Runtime on its CPU provider, which is also the
/// fallback when a listed accelerator cannot be registered.
pub fn detector_execution_providers() -> Vec<ExecutionProviderDispatch> {
    let providers = platform_providers();
    log::debug!(
        "Face detector execution providers: {}",
        if providers.is_empty() {
            "CPU".to_string()
        } else {
            format!("{} accelerator(s) + CPU", providers.len())
        }
    );
    providers
}

#[cfg(target_os = "macos")]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
}

#[cfg(target_os = "windows")]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    #[test]
    fn test_other_platforms_use_cpu_only() {
        assert!(detector_execution_providers().is_empty());
    }

    #[cfg(any(target_os = "macos", target_os = "windows"))]
    #[test]
    fn test_desktop_platforms_request_one_accelerator() {
        assert_eq!(detector_execution_providers().len(), 1);
    }
}
