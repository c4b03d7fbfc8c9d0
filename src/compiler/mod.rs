//! 编译模块：原始规则 -> 可执行正则模式

pub mod pattern;
pub mod compiler;

pub use pattern::{CompiledPattern, CompiledRuleLibrary, CompiledTechRule, PatternTags};
pub use compiler::RuleCompiler;
