// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 报文标头集合
//!
//! 请求与响应共用的标头容器。字段名按大小写不敏感的方式比较，
//! 但保留第一次写入时的原始拼写，便于原样输出。

use crate::param::CRLF;

/// 有序的标头列表。同名字段（忽略大小写）只保留一个。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 写入一个字段。已存在同名字段时替换其值。
    pub fn insert(&mut self, name: &str, value: &str) {
        match self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 同名字段已存在且取值不同
    pub fn conflicts(&self, name: &str, value: &str) -> bool {
        matches!(self.get(name), Some(existing) if existing != value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self
            .entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 解析 `Name: value` 形式的一行。冒号缺失或字段名为空时返回 `None`。
    pub fn parse_line(line: &str) -> Option<(&str, &str)> {
        let (name, value) = line.split_once(':')?;
        let name = name.trim();
        if name.is_empty() || name.contains(' ') {
            return None;
        }
        Some((name, value.trim()))
    }

    /// 按报文格式输出，每个字段以 CRLF 结尾。
    pub fn to_wire(&self) -> String {
        let mut s = String::new();
        for (name, value) in &self.entries {
            s.push_str(name);
            s.push_str(": ");
            s.push_str(value);
            s.push_str(CRLF);
        }
        s
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Headers {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
