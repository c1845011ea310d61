//! 规则常量定义

/// 棋盘边长
pub const BOARD_WIDTH: usize = 3;

/// 格子总数
pub const CELL_COUNT: usize = BOARD_WIDTH * BOARD_WIDTH;

/// 中心格索引
pub const CENTER: usize = 4;

/// 四个角的索引
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// 八条连线：三横、三竖、两条对角线
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 空格在局面键中的字符
pub const EMPTY_CHAR: char = '-';
