//! 配置校验模块
//!
//! 校验规则：
//! - base_rate > 0, max_in_flight > 0
//! - schedule 每段 duration_secs > 0
//! - sink 名称非空，必填参数齐全且可解析

use std::net::SocketAddr;

use contracts::{ContractError, RunBlueprint, SinkConfig, SinkType};

/// 数值型 sink 参数
const NUMERIC_PARAMS: [&str; 2] = ["max_payload_bytes", "max_packet_size"];

/// 校验 RunBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    validate_run(blueprint)?;
    validate_schedule(blueprint)?;
    if let Some(sink) = &blueprint.sink {
        validate_sink(sink)?;
    }
    Ok(())
}

/// 校验负载参数
fn validate_run(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    let run = &blueprint.run;

    if run.base_rate == 0 {
        return Err(ContractError::config_validation(
            "run.base_rate",
            "base_rate must be > 0",
        ));
    }

    if run.max_in_flight == 0 {
        return Err(ContractError::config_validation(
            "run.max_in_flight",
            "max_in_flight must be > 0",
        ));
    }

    Ok(())
}

/// 校验 schedule 分段
fn validate_schedule(blueprint: &RunBlueprint) -> Result<(), ContractError> {
    for (idx, segment) in blueprint.schedule.iter().enumerate() {
        if segment.duration_secs == 0 {
            return Err(ContractError::config_validation(
                format!("schedule[{idx}].duration_secs"),
                format!("segment '{}' must last at least 1 second", segment.mode),
            ));
        }
    }
    Ok(())
}

/// 校验 sink 配置
///
/// 命令行传入的 sink 参数保存前也走这里。
pub fn validate_sink(sink: &SinkConfig) -> Result<(), ContractError> {
    if sink.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name cannot be empty",
        ));
    }

    if sink.sink_type == SinkType::Network {
        let addr = sink.params.get("addr").ok_or_else(|| {
            ContractError::config_validation(
                "sink.params.addr",
                "network sink requires 'addr'",
            )
        })?;
        addr.parse::<SocketAddr>().map_err(|e| {
            ContractError::config_validation(
                "sink.params.addr",
                format!("invalid address '{addr}': {e}"),
            )
        })?;
    }

    if sink.sink_type == SinkType::File {
        if let Some(path) = sink.params.get("path") {
            if path.trim().is_empty() {
                return Err(ContractError::config_validation(
                    "sink.params.path",
                    "path cannot be empty",
                ));
            }
        }
    }

    for key in NUMERIC_PARAMS {
        if let Some(raw) = sink.params.get(key) {
            match raw.parse::<usize>() {
                Ok(0) => {
                    return Err(ContractError::config_validation(
                        format!("sink.params.{key}"),
                        "must be > 0",
                    ))
                }
                Ok(_) => {}
                Err(e) => {
                    return Err(ContractError::config_validation(
                        format!("sink.params.{key}"),
                        format!("invalid number '{raw}': {e}"),
                    ))
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{LoadMode, SegmentConfig};
    use std::collections::HashMap;

    fn sink(sink_type: SinkType, params: &[(&str, &str)]) -> SinkConfig {
        SinkConfig {
            name: "out".to_string(),
            sink_type,
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn field_of(err: ContractError) -> String {
        match err {
            ContractError::ConfigValidation { field, .. } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_blueprint() {
        let mut bp = RunBlueprint::default();
        bp.sink = Some(sink(SinkType::Network, &[("addr", "127.0.0.1:9999")]));
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_zero_base_rate() {
        let mut bp = RunBlueprint::default();
        bp.run.base_rate = 0;
        assert_eq!(field_of(validate(&bp).unwrap_err()), "run.base_rate");
    }

    #[test]
    fn test_zero_max_in_flight() {
        let mut bp = RunBlueprint::default();
        bp.run.max_in_flight = 0;
        assert_eq!(field_of(validate(&bp).unwrap_err()), "run.max_in_flight");
    }

    #[test]
    fn test_zero_length_segment() {
        let mut bp = RunBlueprint::default();
        bp.schedule = vec![
            SegmentConfig {
                mode: LoadMode::Steady,
                duration_secs: 10,
            },
            SegmentConfig {
                mode: LoadMode::Outage,
                duration_secs: 0,
            },
        ];
        assert_eq!(
            field_of(validate(&bp).unwrap_err()),
            "schedule[1].duration_secs"
        );
    }

    #[test]
    fn test_empty_sink_name() {
        let mut config = sink(SinkType::Log, &[]);
        config.name = "  ".to_string();
        assert_eq!(field_of(validate_sink(&config).unwrap_err()), "sink.name");
    }

    #[test]
    fn test_network_sink_requires_valid_addr() {
        let missing = sink(SinkType::Network, &[]);
        assert_eq!(
            field_of(validate_sink(&missing).unwrap_err()),
            "sink.params.addr"
        );

        let invalid = sink(SinkType::Network, &[("addr", "localhost")]);
        assert_eq!(
            field_of(validate_sink(&invalid).unwrap_err()),
            "sink.params.addr"
        );
    }

    #[test]
    fn test_numeric_params() {
        let bad = sink(SinkType::Memory, &[("max_payload_bytes", "big")]);
        assert_eq!(
            field_of(validate_sink(&bad).unwrap_err()),
            "sink.params.max_payload_bytes"
        );

        let zero = sink(
            SinkType::Network,
            &[("addr", "127.0.0.1:1"), ("max_packet_size", "0")],
        );
        assert_eq!(
            field_of(validate_sink(&zero).unwrap_err()),
            "sink.params.max_packet_size"
        );
    }

    #[test]
    fn test_file_sink_path_defaults() {
        assert!(validate_sink(&sink(SinkType::File, &[])).is_ok());
        let empty = sink(SinkType::File, &[("path", "")]);
        assert_eq!(
            field_of(validate_sink(&empty).unwrap_err()),
            "sink.params.path"
        );
    }
}
