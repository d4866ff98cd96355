//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (validator derive：id / name 非空)
//! - decoder id 唯一，instance id 唯一
//! - instance 引用的 decoder 存在
//! - stack 目标存在，且堆叠关系无环
//! - Meta 输出声明 meta，且 value_type 为 int / float
//! - annotation row 引用的 class 下标合法
//! - 每个 (session, kind) 至多一个 sink

use std::collections::{HashMap, HashSet};

use contracts::{ContractError, MetaType, OutputKind, StackBlueprint};
use validator::{Validate, ValidationErrors};

/// 校验 StackBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &StackBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_decoder_ids(blueprint)?;
    validate_annotation_rows(blueprint)?;
    validate_instance_ids(blueprint)?;
    validate_decoder_refs(blueprint)?;
    validate_outputs(blueprint)?;
    validate_stack(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// 字段级校验 (validator derive)
fn validate_fields(blueprint: &StackBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let (field, message) = first_error(&errors);
        ContractError::config_validation(field, message)
    })
}

/// 取出第一条字段错误 (路径, 消息)
fn first_error(errors: &ValidationErrors) -> (String, String) {
    flatten(errors, String::new())
        .into_iter()
        .next()
        .unwrap_or_else(|| ("<root>".to_string(), "invalid configuration".to_string()))
}

fn flatten(errors: &ValidationErrors, prefix: String) -> Vec<(String, String)> {
    use validator::ValidationErrorsKind;

    let mut out = Vec::new();
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => out.extend(flatten(inner, path)),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    out.extend(flatten(inner, format!("{path}[{idx}]")));
                }
            }
        }
    }
    out.sort();
    out
}

/// 校验 decoder id 唯一性
fn validate_decoder_ids(blueprint: &StackBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for decoder in &blueprint.decoders {
        if !seen.insert(&decoder.id) {
            return Err(ContractError::config_validation(
                format!("decoders[id={}]", decoder.id),
                "duplicate decoder id",
            ));
        }
    }
    Ok(())
}

/// 校验 annotation row 的 class 下标
fn validate_annotation_rows(blueprint: &StackBlueprint) -> Result<(), ContractError> {
    for decoder in &blueprint.decoders {
        let class_count = decoder.annotation_classes.len();
        for row in &decoder.annotation_rows {
            if let Some(bad) = row.classes.iter().find(|&&c| c >= class_count) {
                return Err(ContractError::config_validation(
                    format!("decoders[{}].annotation_rows[{}]", decoder.id, row.id),
                    format!(
                        "class index {bad} out of range ({class_count} annotation classes)"
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// 校验 instance id 唯一性
fn validate_instance_ids(blueprint: &StackBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for instance in &blueprint.instances {
        if !seen.insert(&instance.id) {
            return Err(ContractError::config_validation(
                format!("instances[id={}]", instance.id),
                "duplicate instance id",
            ));
        }
    }
    Ok(())
}

/// 校验 instance 引用的 decoder 存在
fn validate_decoder_refs(blueprint: &StackBlueprint) -> Result<(), ContractError> {
    for instance in &blueprint.instances {
        if blueprint.decoder(&instance.decoder).is_none() {
            return Err(ContractError::config_validation(
                format!("instances[{}].decoder", instance.id),
                format!("decoder '{}' not found", instance.decoder),
            ));
        }
    }
    Ok(())
}

/// 校验声明的输出流
fn validate_outputs(blueprint: &StackBlueprint) -> Result<(), ContractError> {
    for instance in &blueprint.instances {
        for (idx, output) in instance.outputs.iter().enumerate() {
            let field = || format!("instances[{}].outputs[{}]", instance.id, idx);
            match output.kind {
                OutputKind::Meta => {
                    let Some(meta) = &output.meta else {
                        return Err(ContractError::config_validation(
                            field(),
                            "meta output requires a meta description",
                        ));
                    };
                    if MetaType::from_value_type(meta.value_type).is_none() {
                        return Err(ContractError::config_validation(
                            field(),
                            format!(
                                "meta value_type must be int or float, got {}",
                                meta.value_type
                            ),
                        ));
                    }
                }
                OutputKind::Unsupported(code) => {
                    return Err(ContractError::config_validation(
                        field(),
                        format!("unsupported output kind {code}"),
                    ));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// 校验堆叠拓扑：目标存在、不自堆叠、无环
fn validate_stack(blueprint: &StackBlueprint) -> Result<(), ContractError> {
    let ids: HashSet<&str> = blueprint.instances.iter().map(|i| i.id.as_str()).collect();
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();

    for instance in &blueprint.instances {
        for top in &instance.stack {
            if !ids.contains(top.as_str()) {
                return Err(ContractError::config_validation(
                    format!("instances[{}].stack", instance.id),
                    format!("stacked instance '{top}' not found"),
                ));
            }
            edges
                .entry(instance.id.as_str())
                .or_default()
                .push(top.as_str());
        }
    }

    // Iterative DFS with colors; revisiting a node on the current path is a cycle
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Active,
        Done,
    }
    let mut marks: HashMap<&str, Mark> = HashMap::new();

    for root in blueprint.instances.iter().map(|i| i.id.as_str()) {
        if marks.contains_key(root) {
            continue;
        }
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        marks.insert(root, Mark::Active);

        while let Some((node, next)) = stack.last().copied() {
            let children = edges.get(node).map(Vec::as_slice).unwrap_or_default();
            if let Some(&child) = children.get(next) {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                match marks.get(child) {
                    Some(Mark::Active) => {
                        return Err(ContractError::config_validation(
                            format!("instances[{node}].stack"),
                            format!("stacking '{child}' on '{node}' creates a cycle"),
                        ));
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(child, Mark::Active);
                        stack.push((child, 0));
                    }
                }
            } else {
                marks.insert(node, Mark::Done);
                stack.pop();
            }
        }
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &StackBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if let OutputKind::Unsupported(code) = sink.kind {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].kind"),
                format!("unsupported output kind {code}"),
            ));
        }
        if !seen.insert((sink.session, sink.kind)) {
            return Err(ContractError::config_validation(
                format!("sinks[{}]", sink.name),
                format!(
                    "duplicate sink for session {} kind {}",
                    sink.session, sink.kind
                ),
            ));
        }
    }
    Ok(())
}
