use crate::adapter::{
    AdapterSpec, Field, FieldSpec, Locate, PostProcess, RowSpec, SiteAdapter, TokenSpec,
};
use crate::config::Config;
use crate::error::AdapterError;

pub const HOST: &str = "https://www.javbus.com/";
pub const NAME: &str = "Javbus";

/// Javbus as published on its main domain.
pub fn spec() -> AdapterSpec {
    AdapterSpec {
        name: NAME.to_string(),
        host: HOST.to_string(),
        label: "span".to_string(),
        fields: vec![
            FieldSpec::text(Field::Title, Locate::Css("h3".into())).required(),
            FieldSpec::text(Field::Premiered, Locate::LabelTail("發行日期:".into())),
            FieldSpec::text(Field::Runtime, Locate::LabelTail("長度:".into()))
                .post(PostProcess::StripSuffix("分鐘".into())),
            FieldSpec::text(Field::Director, Locate::LabelLink("導演:".into())),
            FieldSpec::text(Field::Studio, Locate::LabelLink("製作商:".into())),
            FieldSpec::text(Field::Publisher, Locate::LabelLink("發行商:".into())),
            FieldSpec::text(Field::Series, Locate::LabelLink("系列:".into())),
            FieldSpec::attr(Field::Cover, Locate::Css("a.bigImage".into()), "href")
                .post(PostProcess::AbsoluteUrl),
        ],
        tags: "span.genre a[href*='genre']".to_string(),
        actors: "span.genre a[href*='star']".to_string(),
        actor_thumb: "/pics/actress/{code}_a.jpg".to_string(),
        tokens: TokenSpec {
            gid: r"var gid = (\w+);".to_string(),
            uc: r"var uc = (\w+);".to_string(),
            img: r"var img = '(.+)';".to_string(),
        },
        ajax_path: "/ajax/uncledatoolsbyajax.php".to_string(),
        lang: "zh".to_string(),
        floor: (100, 1000),
        fragment_charset: "utf-8".to_string(),
        rows: RowSpec {
            row: "tr".to_string(),
            name_cell: 0,
            size_cell: 1,
            date_cell: 2,
            hd_label: "高清".to_string(),
            zh_label: "字幕".to_string(),
            uncensored_markers: vec!["无码".to_string(), "破解".to_string()],
        },
    }
}

/// Compiled adapter, honouring a mirror host from the config.
pub fn adapter(config: &Config) -> Result<SiteAdapter, AdapterError> {
    let mut spec = spec();
    if let Some(base) = &config.base_url {
        spec.host = if base.ends_with('/') { base.clone() } else { format!("{base}/") };
    }
    spec.compile()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_adapter_compiles() {
        let a = adapter(&Config::default()).unwrap();
        assert_eq!(a.name, "Javbus");
        assert_eq!(a.host.as_str(), HOST);
        assert_eq!(a.ajax_url().as_str(), "https://www.javbus.com/ajax/uncledatoolsbyajax.php");
        assert_eq!(a.floor, 100..=1000);
    }

    #[test]
    fn mirror_host_moves_every_url() {
        let config = Config { base_url: Some("https://www.busjav.test".into()), ..Config::default() };
        let a = adapter(&config).unwrap();
        assert_eq!(a.detail_url("ABP-123").unwrap().as_str(), "https://www.busjav.test/ABP-123");
        assert_eq!(a.ajax_url().as_str(), "https://www.busjav.test/ajax/uncledatoolsbyajax.php");
    }

    #[test]
    fn bad_mirror_is_rejected() {
        let config = Config { base_url: Some("not a url".into()), ..Config::default() };
        assert!(matches!(adapter(&config), Err(AdapterError::BaseUrl { .. })));
    }
}
