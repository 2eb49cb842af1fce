//! 文本处理辅助函数

/// 按字符数截取前缀，保证不会切断多字节字符
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// 以空白分隔统计单词数
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// 将行业名称转换为文件名片段，如 `Renewable Energy` -> `renewable_energy`
pub fn file_stem(industry: &str) -> String {
    let stem: String = industry
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        "industry".to_string()
    } else {
        stem
    }
}
