//! Seed lists: the ordered `(name, category)` pairs a run works through
//!
//! A seed file is TOML, either one table per item or grouped by category:
//!
//! ```toml
//! [[seed]]
//! name = "苹果"
//! category = "食物"
//!
//! [[group]]
//! category = "航空器"
//! names = ["飞机", "直升机"]
//! ```
//!
//! JSON arrays of `["name", "category"]` pairs or `{"name", "category"}`
//! objects are accepted too. Duplicate names keep their first position.

use primer_core::{PrimerError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// One entity to generate
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Seed {
    pub name: String,
    pub category: String,
}

impl Seed {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    seed: Vec<Seed>,
    #[serde(default)]
    group: Vec<SeedGroup>,
}

#[derive(Debug, Deserialize)]
struct SeedGroup {
    category: String,
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonSeed {
    Pair(String, String),
    Object(Seed),
}

/// Ordered, de-duplicated seed list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedList {
    seeds: Vec<Seed>,
}

impl SeedList {
    pub fn new<I: IntoIterator<Item = Seed>>(seeds: I) -> Self {
        let mut seen = HashSet::new();
        let seeds = seeds
            .into_iter()
            .filter(|s| !s.name.trim().is_empty())
            .filter(|s| seen.insert(s.name.clone()))
            .collect();
        Self { seeds }
    }

    /// The built-in list of vehicles, furniture, animals, weather, food and professions
    pub fn builtin() -> Self {
        Self::new(
            DEFAULT_SEEDS
                .iter()
                .flat_map(|(category, names)| names.iter().map(move |n| Seed::new(*n, *category))),
        )
    }

    /// Load a seed file; `.json` files are parsed as JSON, anything else as TOML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let list = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        };
        list.map_err(|e| {
            PrimerError::ConfigurationError(format!(
                "invalid seed file {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: SeedFile = toml::from_str(content)?;
        let grouped = file.group.into_iter().flat_map(|g| {
            let category = g.category;
            g.names
                .into_iter()
                .map(move |name| Seed::new(name, category.clone()))
        });
        Ok(Self::new(file.seed.into_iter().chain(grouped)))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: Vec<JsonSeed> = serde_json::from_str(content)?;
        Ok(Self::new(raw.into_iter().map(|s| match s {
            JsonSeed::Pair(name, category) => Seed::new(name, category),
            JsonSeed::Object(seed) => seed,
        })))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seed> {
        self.seeds.iter()
    }

    pub fn as_slice(&self) -> &[Seed] {
        &self.seeds
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seeds.iter().any(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }
}

const DEFAULT_SEEDS: &[(&str, &[&str])] = &[
    (
        "小型车辆",
        &[
            "小汽车", "出租车", "跑车", "越野车", "面包车", "皮卡车", "敞篷车", "老爷车",
            "电动汽车", "混合动力车", "三轮车", "摩托车", "电动摩托车", "自行车", "电动自行车",
            "滑板车", "平衡车", "卡丁车", "儿童车",
        ],
    ),
    (
        "公共交通",
        &[
            "公交车", "双层巴士", "校车", "长途客车", "地铁", "轻轨", "有轨电车", "火车", "高铁",
            "动车", "磁悬浮列车", "单轨列车", "缆车",
        ],
    ),
    (
        "特种车辆",
        &[
            "消防车", "救护车", "警车", "工程车", "押运车", "邮政车", "垃圾车", "洒水车", "清扫车",
            "除雪车", "道路救援车", "电视转播车", "移动餐车",
        ],
    ),
    (
        "工程机械",
        &[
            "挖掘机", "推土机", "起重机", "装载机", "压路机", "平地机", "铲运机", "混凝土搅拌车",
            "泵车", "塔吊", "升降机", "叉车", "吊车",
        ],
    ),
    (
        "货运车辆",
        &[
            "货车", "大货车", "厢式货车", "冷藏车", "油罐车", "自卸车", "半挂车", "全挂车",
            "集装箱卡车", "平板车", "牵引车", "农用车", "三轮货车",
        ],
    ),
    (
        "特殊用途车辆",
        &[
            "房车", "露营车", "餐车", "冰淇淋车", "移动图书馆", "献血车", "移动医疗车", "观光车",
            "高尔夫球车", "机场摆渡车", "无轨电车", "双层观光巴士",
        ],
    ),
    (
        "紧急救援车辆",
        &[
            "消防云梯车", "消防指挥车", "急救车", "救援车", "抢险车", "警用摩托车", "防暴车",
            "装甲车", "运兵车", "通信指挥车",
        ],
    ),
    (
        "军用车辆",
        &["坦克", "装甲运兵车", "军用吉普", "军用卡车", "导弹发射车", "雷达车"],
    ),
    (
        "航空器",
        &[
            "飞机", "直升机", "战斗机", "轰炸机", "运输机", "客机", "货机", "水上飞机", "滑翔机",
            "热气球", "飞艇", "无人机", "航天飞机",
        ],
    ),
    (
        "船舶",
        &[
            "轮船", "客轮", "货轮", "油轮", "集装箱船", "渡轮", "游艇", "帆船", "渔船", "拖船",
            "驳船", "气垫船", "潜水艇", "破冰船", "航空母舰", "巡洋舰", "驱逐舰", "护卫舰", "快艇",
            "摩托艇", "皮划艇", "龙舟",
        ],
    ),
    (
        "农用机械",
        &["拖拉机", "收割机", "播种机", "插秧机", "联合收割机", "喷雾器", "农用运输车"],
    ),
    (
        "其他特殊车辆",
        &["月球车", "火星车", "矿用车", "隧道掘进机", "盾构机", "压裂车", "钻井平台"],
    ),
    (
        "家具",
        &[
            "桌子", "椅子", "沙发", "床", "书架", "衣柜", "茶几", "电视柜", "学习桌", "儿童床",
            "玩具箱", "鞋柜",
        ],
    ),
    (
        "动物",
        &[
            "小狗", "小猫", "兔子", "小鸟", "金鱼", "仓鼠", "乌龟", "蝴蝶", "大象", "长颈鹿", "狮子",
            "熊猫",
        ],
    ),
    (
        "天气",
        &[
            "太阳", "云朵", "雨", "雪", "彩虹", "风", "雷电", "雾", "冰雹", "霜", "露珠", "星空",
        ],
    ),
    (
        "食物",
        &[
            "苹果", "香蕉", "面包", "牛奶", "鸡蛋", "饼干", "果汁", "蔬菜", "米饭", "面条", "蛋糕",
            "冰淇淋",
        ],
    ),
    (
        "职业",
        &[
            "医生", "护士", "老师", "警察", "消防员", "厨师", "司机", "农民", "宇航员", "运动员",
            "画家", "音乐家",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_list() {
        let seeds = SeedList::builtin();
        assert_eq!(seeds.as_slice()[0], Seed::new("小汽车", "小型车辆"));
        assert!(seeds.contains("苹果"));
        assert!(seeds.contains("音乐家"));
        assert_eq!(seeds.iter().filter(|s| s.category == "天气").count(), 12);
        // Unique names
        let names: HashSet<_> = seeds.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), seeds.len());
    }

    #[test]
    fn test_toml_seed_file() {
        let seeds = SeedList::from_toml_str(
            r#"
[[seed]]
name = "苹果"
category = "食物"

[[group]]
category = "航空器"
names = ["飞机", "直升机", "苹果"]
"#,
        )
        .unwrap();
        assert_eq!(
            seeds.as_slice(),
            &[
                Seed::new("苹果", "食物"),
                Seed::new("飞机", "航空器"),
                Seed::new("直升机", "航空器"),
            ]
        );
    }

    #[test]
    fn test_json_seed_file() {
        let seeds = SeedList::from_json_str(
            r#"[["苹果", "食物"], {"name": "飞机", "category": "航空器"}, ["", "空"]]"#,
        )
        .unwrap();
        assert_eq!(
            seeds.as_slice(),
            &[Seed::new("苹果", "食物"), Seed::new("飞机", "航空器")]
        );
    }

    #[test]
    fn test_load_by_extension() {
        let dir = std::env::temp_dir().join(format!("primer_seed_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let json = dir.join("seeds.json");
        std::fs::write(&json, r#"[["苹果", "食物"]]"#).unwrap();
        assert_eq!(SeedList::load(&json).unwrap().len(), 1);

        let bad = dir.join("seeds.toml");
        std::fs::write(&bad, "[[seed]]\nname = 1\n").unwrap();
        let err = SeedList::load(&bad).unwrap_err();
        assert!(matches!(err, PrimerError::ConfigurationError(_)));

        std::fs::remove_dir_all(&dir).ok();
    }
}
