use serde::{Serialize, Serializer, ser::SerializeStruct};

/// 标签及其使用次数，序列化时附带 `path`
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TagUsage {
    pub name: String,
    pub count: i64,
}

impl TagUsage {
    pub fn absolute_path(&self) -> String {
        format!("/tags/{}/", self.name)
    }
}

impl Serialize for TagUsage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TagUsage", 3)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("count", &self.count)?;
        s.serialize_field("path", &self.absolute_path())?;
        s.end()
    }
}

/// 解析标签输入文本
///
/// 含逗号时按逗号切分，否则按空白切分；去除空项，去重并排序。
pub fn parse_tag_input(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = if input.contains(',') {
        input.split(',').map(str::trim).map(String::from).collect()
    } else {
        input.split_whitespace().map(String::from).collect()
    };

    tags.retain(|t| !t.is_empty());
    tags.sort();
    tags.dedup();
    tags
}
