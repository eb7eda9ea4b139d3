use crate::wire::HealthRes;

/// Health check shared by every transport.
#[derive(Clone, Copy)]
pub struct HealthService;

impl HealthService {
    /// Report liveness. The service holds no state that could make it unhealthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Consultation service is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_alive() {
        let res = HealthService::check_health();
        assert!(res.ok);
        assert!(res.message.contains("alive"));
    }
}
