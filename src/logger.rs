// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 日志初始化。优先读取 log4rs 的 YAML 配置，文件缺失或无效时退回到只输出到控制台的默认配置。

use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

const DEFAULT_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}";

/// 初始化全局日志。重复初始化时返回错误描述，调用方可以忽略。
pub fn init(config_path: &str) -> Result<(), String> {
    match log4rs::init_file(config_path, Default::default()) {
        Ok(()) => Ok(()),
        Err(file_err) => {
            let stderr = ConsoleAppender::builder()
                .target(Target::Stderr)
                .encoder(Box::new(PatternEncoder::new(DEFAULT_PATTERN)))
                .build();
            let config = Config::builder()
                .appender(Appender::builder().build("stderr", Box::new(stderr)))
                .build(Root::builder().appender("stderr").build(LevelFilter::Info))
                .map_err(|e| e.to_string())?;
            log4rs::init_config(config).map_err(|e| e.to_string())?;
            log::warn!("无法从{}载入日志配置（{}），使用默认控制台日志", config_path, file_err);
            Ok(())
        }
    }
}
