// 目录数据库结构
// 表定义在进程启动时显式构造一次，再交给存储层建表

use crate::models::{
    EMAIL_MAX_LEN, ENTITY_IMAGE_MAX_LEN, ENTITY_NAME_MAX_LEN, EntityKind, PERSON_NAME_MAX_LEN,
};

pub const USER_TABLE: &str = "user";
pub const LINK_USER_COLUMN: &str = "user_id";

// bcrypt 哈希固定 60 字符
const PASSWORD_HASH_LEN: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Serial,
    Integer,
    Varchar(usize),
    Jsonb,
}

impl SqlType {
    fn ddl(self) -> String {
        match self {
            SqlType::Serial => "SERIAL".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::Varchar(len) => format!("VARCHAR({})", len),
            SqlType::Jsonb => "JSONB".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete_cascade: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub unique: bool,
    pub references: Option<ForeignKey>,
}

impl Column {
    fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
            unique: false,
            references: None,
        }
    }

    fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some(ForeignKey {
            table,
            column,
            on_delete_cascade: true,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: Vec<Column>,
    pub primary_key: Vec<&'static str>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn create_statement(&self) -> String {
        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut line = format!("{} {}", quote_ident(column.name), column.sql_type.ddl());
                if !column.nullable {
                    line.push_str(" NOT NULL");
                }
                if column.unique {
                    line.push_str(" UNIQUE");
                }
                if let Some(fk) = &column.references {
                    line.push_str(&format!(
                        " REFERENCES {}({})",
                        quote_ident(fk.table),
                        quote_ident(fk.column)
                    ));
                    if fk.on_delete_cascade {
                        line.push_str(" ON DELETE CASCADE");
                    }
                }
                line
            })
            .collect();

        let pk = self
            .primary_key
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("PRIMARY KEY ({})", pk));

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            quote_ident(self.name),
            lines.join(",\n    ")
        )
    }
}

/// 整个目录的表集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    tables: Vec<Table>,
}

impl Schema {
    pub fn catalog() -> Self {
        let mut tables = vec![Table {
            name: USER_TABLE,
            columns: vec![
                Column::new("id", SqlType::Serial).not_null(),
                Column::new("email", SqlType::Varchar(EMAIL_MAX_LEN))
                    .not_null()
                    .unique(),
                Column::new("password", SqlType::Varchar(PASSWORD_HASH_LEN)).not_null(),
                Column::new("name", SqlType::Varchar(PERSON_NAME_MAX_LEN)),
                Column::new("lastname", SqlType::Varchar(PERSON_NAME_MAX_LEN)),
            ],
            primary_key: vec!["id"],
        }];

        for kind in EntityKind::ALL {
            tables.push(Table {
                name: kind.table(),
                columns: vec![
                    Column::new("id", SqlType::Serial).not_null(),
                    Column::new("name", SqlType::Varchar(ENTITY_NAME_MAX_LEN)).not_null(),
                    Column::new("image", SqlType::Varchar(ENTITY_IMAGE_MAX_LEN)),
                    Column::new("attributes", SqlType::Jsonb),
                ],
                primary_key: vec!["id"],
            });
        }

        // 关联表依赖两端的表，放在最后
        for kind in EntityKind::ALL {
            tables.push(Table {
                name: kind.link_table(),
                columns: vec![
                    Column::new(LINK_USER_COLUMN, SqlType::Integer)
                        .not_null()
                        .references(USER_TABLE, "id"),
                    Column::new(kind.link_column(), SqlType::Integer)
                        .not_null()
                        .references(kind.table(), "id"),
                ],
                primary_key: vec![LINK_USER_COLUMN, kind.link_column()],
            });
        }

        Schema { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn create_statements(&self) -> Vec<String> {
        self.tables.iter().map(Table::create_statement).collect()
    }
}

/// 所有标识符都加引号，"user" 是 Postgres 保留字
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
